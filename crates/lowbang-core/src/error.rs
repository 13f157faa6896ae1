use thiserror::Error;

/// Validation and contract errors exposed by `lowbang-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker '{value}' must match ^[A-Z]{{1,5}}(-[A-Z]{{1,2}})?$ (uppercase, e.g. AAPL or BRK-B)")]
    InvalidTicker { value: String },

    #[error("invalid source '{value}', expected one of implied_volatility, intrinsic_value, previous_close")]
    InvalidSource { value: String },
    #[error("url template must contain '{{ticker}}': '{value}'")]
    InvalidUrlTemplate { value: String },
    #[error("locator cannot be empty")]
    EmptyLocator,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("factor '{field}' must be greater than zero")]
    NonPositiveFactor { field: &'static str },

    #[error("timestamp must be RFC3339 UTC: '{value}'")]
    TimestampNotUtc { value: String },

    #[error("invalid value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}
