//! # Domain Models
//!
//! Strongly-typed inputs shared by every stage of an analysis.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Validated exchange ticker used to address the source pages |
//! | [`UtcDateTime`] | RFC3339 UTC timestamp stamped on analysis reports |
//!
//! Construction validates all invariants, so a [`Ticker`] in hand is always
//! safe to substitute into a source URL.

mod ticker;
mod timestamp;

pub use ticker::Ticker;
pub use timestamp::UtcDateTime;
