//! Source adapters.
//!
//! Each adapter is pure configuration for the
//! [`FieldExtractor`](crate::FieldExtractor): where the page lives, how to find
//! the figure on it, and how to clean the figure's text.
//!
//! | Adapter | Field | Site |
//! |---------|-------|------|
//! | [`optioncharts`] | implied volatility | optioncharts.io |
//! | [`alphaspread`] | intrinsic value | alphaspread.com |
//! | [`yahoo`] | previous close | finance.yahoo.com |

pub mod alphaspread;
pub mod optioncharts;
pub mod yahoo;

use serde::{Deserialize, Serialize};

use crate::browser::Locator;
use crate::{CleaningRule, FieldSource, Ticker, ValidationError};

const TICKER_PLACEHOLDER: &str = "{ticker}";

/// Immutable description of where and how one field is scraped.
///
/// Deserialization runs the same checks as [`SourceConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SourceConfigFields")]
pub struct SourceConfig {
    pub source: FieldSource,
    url_template: String,
    pub locator: Locator,
    pub cleaning: CleaningRule,
}

impl SourceConfig {
    pub fn new(
        source: FieldSource,
        url_template: impl Into<String>,
        locator: Locator,
        cleaning: CleaningRule,
    ) -> Result<Self, ValidationError> {
        let url_template = url_template.into();
        if !url_template.contains(TICKER_PLACEHOLDER) {
            return Err(ValidationError::InvalidUrlTemplate {
                value: url_template,
            });
        }
        if locator.is_empty() {
            return Err(ValidationError::EmptyLocator);
        }

        Ok(Self {
            source,
            url_template,
            locator,
            cleaning,
        })
    }

    /// Built-in configuration for `source`.
    pub fn default_for(source: FieldSource) -> Self {
        match source {
            FieldSource::ImpliedVolatility => optioncharts::config(),
            FieldSource::IntrinsicValue => alphaspread::config(),
            FieldSource::PreviousClose => yahoo::config(),
        }
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Same locator and cleaning rule against a different page.
    pub fn with_url_template(self, url_template: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(self.source, url_template, self.locator, self.cleaning)
    }

    pub fn url_for(&self, ticker: &Ticker) -> String {
        self.url_template
            .replace(TICKER_PLACEHOLDER, &urlencoding::encode(ticker.as_str()))
    }
}

#[derive(Deserialize)]
struct SourceConfigFields {
    source: FieldSource,
    url_template: String,
    locator: Locator,
    cleaning: CleaningRule,
}

impl TryFrom<SourceConfigFields> for SourceConfig {
    type Error = ValidationError;

    fn try_from(fields: SourceConfigFields) -> Result<Self, Self::Error> {
        Self::new(fields.source, fields.url_template, fields.locator, fields.cleaning)
    }
}

/// One configuration per [`FieldSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    pub implied_volatility: SourceConfig,
    pub intrinsic_value: SourceConfig,
    pub previous_close: SourceConfig,
}

impl SourceSet {
    pub fn get(&self, source: FieldSource) -> &SourceConfig {
        match source {
            FieldSource::ImpliedVolatility => &self.implied_volatility,
            FieldSource::IntrinsicValue => &self.intrinsic_value,
            FieldSource::PreviousClose => &self.previous_close,
        }
    }

    /// Replace the configuration for the config's own field.
    pub fn with(mut self, config: SourceConfig) -> Self {
        match config.source {
            FieldSource::ImpliedVolatility => self.implied_volatility = config,
            FieldSource::IntrinsicValue => self.intrinsic_value = config,
            FieldSource::PreviousClose => self.previous_close = config,
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceConfig> {
        FieldSource::ALL.into_iter().map(|source| self.get(source))
    }
}

impl Default for SourceSet {
    fn default() -> Self {
        Self {
            implied_volatility: optioncharts::config(),
            intrinsic_value: alphaspread::config(),
            previous_close: yahoo::config(),
        }
    }
}
