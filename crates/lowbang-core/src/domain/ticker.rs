use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_TICKER_LEN: usize = 8;

static TICKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,5}(-[A-Z]{1,2})?$").expect("ticker pattern compiles"));

/// Exchange ticker accepted by the source pages, e.g. `AAPL` or `BRK-B`.
///
/// Case is significant: the pages are addressed with the upper-case symbol, so
/// lower-case input is rejected rather than normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Validate a ticker after trimming surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let len = trimmed.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if !TICKER_PATTERN.is_match(trimmed) {
            return Err(ValidationError::InvalidTicker {
                value: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_class_share_tickers() {
        assert_eq!(Ticker::parse("AAPL").expect("valid").as_str(), "AAPL");
        assert_eq!(Ticker::parse(" BRK-B ").expect("valid").as_str(), "BRK-B");
        assert_eq!(Ticker::parse("F").expect("valid").as_str(), "F");
    }

    #[test]
    fn rejects_lowercase() {
        let err = Ticker::parse("aapl").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTicker { .. }));
    }

    #[test]
    fn rejects_overlong_and_digits() {
        let err = Ticker::parse("TOOLONG1").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTicker { .. }));

        let err = Ticker::parse("ABCDEFGHIJ").expect_err("must fail");
        assert!(matches!(err, ValidationError::TickerTooLong { len: 10, .. }));
    }

    #[test]
    fn rejects_malformed_suffix() {
        for input in ["BRK-", "BRK-ABC", "-B", "BR.K"] {
            assert!(Ticker::parse(input).is_err(), "{input} should be rejected");
        }
    }

    #[test]
    fn serde_round_trip_goes_through_validation() {
        let parsed: Ticker = serde_json::from_str("\"MSFT\"").expect("valid json ticker");
        assert_eq!(parsed.as_str(), "MSFT");
        assert!(serde_json::from_str::<Ticker>("\"msft\"").is_err());
    }
}
