//! Implied volatility from the OptionCharts options overview.
//!
//! The 30-day IV is drawn as a chart label (`24.5%IV`) inside the
//! volatility gauge, which is rendered client-side.

use crate::browser::Locator;
use crate::{CleaningRule, FieldSource};

use super::SourceConfig;

pub const URL_TEMPLATE: &str = "https://optioncharts.io/options/{ticker}";
pub const LABEL_CLASS: &str = "highcharts-text-outline";

pub fn config() -> SourceConfig {
    SourceConfig {
        source: FieldSource::ImpliedVolatility,
        url_template: URL_TEMPLATE.to_owned(),
        locator: Locator::class_name(LABEL_CLASS),
        cleaning: CleaningRule::Percent,
    }
}
