//! # Lowbang Core
//!
//! Entry-price analysis for a single stock ticker.
//!
//! ## Overview
//!
//! An analysis scrapes three figures from public web pages and combines them
//! into suggested entry ranges:
//!
//! - **Implied volatility** from optioncharts.io
//! - **Intrinsic value** from alphaspread.com
//! - **Previous close** from finance.yahoo.com
//!
//! Each figure goes through the same [`FieldExtractor`]: acquire a browser
//! session, wait for one element, clean and parse its text, release the
//! session. A missing figure is an [`Absence`] value with a reason, never a
//! panic or a zero.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Per-site URL, locator and cleaning rule |
//! | [`analysis`] | Request object, orchestrator and report |
//! | [`browser`] | Page driver seam (Chromium, static HTML, scripted) |
//! | [`cleaning`] | Text cleaning rules |
//! | [`config`] | Run configuration and `LOWBANG_*` overrides |
//! | [`domain`] | Ticker and timestamp types |
//! | [`error`] | Core error types |
//! | [`extractor`] | Field Extractor |
//! | [`source`] | Field identifiers |
//! | [`valuation`] | Valuation Combiner |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lowbang_core::{AnalysisRequest, AnalyzerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = AnalyzerBuilder::new().with_mock_mode().build()?;
//!     let report = analyzer.analyze(&AnalysisRequest::for_ticker("AAPL")?).await;
//!
//!     if let Some(valuation) = report.valuation {
//!         println!("entry from ${:.2}", valuation.lower_bound);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │ AnalysisRequest
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │    Analyzer     │────▶│ Valuation        │
//! └────────┬────────┘     │ Combiner         │
//!          │ x3           └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ FieldExtractor  │────▶│ SourceConfig     │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  PageDriver     │  chromium | static | scripted
//! └─────────────────┘
//! ```

pub mod adapters;
pub mod analysis;
pub mod browser;
pub mod cleaning;
pub mod config;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod source;
pub mod valuation;

pub use adapters::{SourceConfig, SourceSet};
pub use analysis::{
    AnalysisReport, AnalysisRequest, Analyzer, AnalyzerBuilder, FieldOutcome, FieldReport,
    SkipReason,
};
pub use browser::{
    ChromiumDriver, ChromiumOptions, DriverStats, ElementScript, Locator, PageDriver, PageScript,
    PageSession, ScriptedDriver, SessionError, SessionErrorKind, StaticHtmlDriver,
};
pub use cleaning::CleaningRule;
pub use config::{AnalyzerConfig, DriverKind, ExecutionMode};
pub use domain::{Ticker, UtcDateTime};
pub use error::ValidationError;
pub use extractor::{
    interpret, Absence, AbsenceReason, Extraction, ExtractionResult, FieldExtractor, Miss,
    WaitPolicy,
};
pub use source::FieldSource;
pub use valuation::{combine, ValuationFactors, ValuationInputs, ValuationOutput};

pub use tokio_util::sync::CancellationToken;
