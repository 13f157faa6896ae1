//! Intrinsic value from the Alpha Spread valuation summary.

use crate::browser::Locator;
use crate::{CleaningRule, FieldSource};

use super::SourceConfig;

pub const URL_TEMPLATE: &str = "https://www.alphaspread.com/security/nyse/{ticker}/summary";
pub const VALUATION_SELECTOR: &str =
    ".ui.intrinsic-value-color.no-margin.valuation-scenario-value.header.restriction-sensitive-data";

pub fn config() -> SourceConfig {
    SourceConfig {
        source: FieldSource::IntrinsicValue,
        url_template: URL_TEMPLATE.to_owned(),
        locator: Locator::css(VALUATION_SELECTOR),
        cleaning: CleaningRule::Currency,
    }
}
