//! Previous close from the Yahoo Finance quote page.

use crate::browser::Locator;
use crate::{CleaningRule, FieldSource};

use super::SourceConfig;

pub const URL_TEMPLATE: &str = "https://sg.finance.yahoo.com/quote/{ticker}/";
pub const STREAMER_TAG: &str = "fin-streamer";
pub const PREVIOUS_CLOSE_FIELD: &str = "regularMarketPreviousClose";

pub fn config() -> SourceConfig {
    SourceConfig {
        source: FieldSource::PreviousClose,
        url_template: URL_TEMPLATE.to_owned(),
        locator: Locator::data_field(STREAMER_TAG, PREVIOUS_CLOSE_FIELD),
        cleaning: CleaningRule::Grouped,
    }
}
