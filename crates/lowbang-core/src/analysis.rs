//! Analysis orchestration.
//!
//! An [`AnalysisRequest`] carries everything one run needs (ticker, id and
//! cancellation token) so nothing is kept in process-wide state. The
//! [`Analyzer`] runs one [`FieldExtractor`] call per [`FieldSource`], either
//! one after another or all at once, and feeds the combiner only when every
//! figure arrived.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::adapters::SourceSet;
use crate::browser::{
    ChromiumDriver, ChromiumOptions, PageDriver, ScriptedDriver, StaticHtmlDriver,
};
use crate::config::{AnalyzerConfig, DriverKind, ExecutionMode};
use crate::extractor::{AbsenceReason, ExtractionResult, FieldExtractor, WaitPolicy};
use crate::valuation::{ValuationFactors, ValuationInputs, ValuationOutput};
use crate::{FieldSource, Ticker, UtcDateTime, ValidationError};

/// One user-triggered analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub ticker: Ticker,
    pub cancel: CancellationToken,
}

impl AnalysisRequest {
    pub fn new(ticker: Ticker) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker,
            cancel: CancellationToken::new(),
        }
    }

    /// Parse and validate `ticker`, then build a request for it.
    pub fn for_ticker(ticker: &str) -> Result<Self, ValidationError> {
        Ticker::parse(ticker).map(Self::new)
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Per-field result as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    Present {
        value: f64,
        raw_text: String,
    },
    Absent {
        reason: AbsenceReason,
        detail: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub source: FieldSource,
    pub url: String,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
    pub latency_ms: u64,
}

impl FieldReport {
    pub fn from_result(url: String, result: ExtractionResult) -> Self {
        match result {
            Ok(extraction) => Self {
                source: extraction.source,
                url,
                outcome: FieldOutcome::Present {
                    value: extraction.value,
                    raw_text: extraction.raw_text,
                },
                latency_ms: extraction.latency_ms,
            },
            Err(absence) => Self {
                source: absence.source,
                url,
                outcome: FieldOutcome::Absent {
                    reason: absence.reason,
                    detail: absence.detail,
                    raw_text: absence.raw_text,
                },
                latency_ms: absence.latency_ms,
            },
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self.outcome {
            FieldOutcome::Present { value, .. } => Some(value),
            FieldOutcome::Absent { .. } => None,
        }
    }

    pub fn absence_reason(&self) -> Option<AbsenceReason> {
        match self.outcome {
            FieldOutcome::Present { .. } => None,
            FieldOutcome::Absent { reason, .. } => Some(reason),
        }
    }
}

/// Why the combiner did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingFields { fields: Vec<FieldSource> },
    InvalidInputs { message: String },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields { fields } => {
                let names = fields
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing fields: {names}")
            }
            Self::InvalidInputs { message } => write!(f, "invalid inputs: {message}"),
        }
    }
}

/// Everything one analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub ticker: Ticker,
    pub generated_at: UtcDateTime,
    pub mode: ExecutionMode,
    pub driver: String,
    /// Always one entry per [`FieldSource`], in [`FieldSource::ALL`] order.
    pub fields: Vec<FieldReport>,
    pub valuation: Option<ValuationOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_skipped_reason: Option<SkipReason>,
    pub latency_ms: u64,
}

impl AnalysisReport {
    pub fn field(&self, source: FieldSource) -> Option<&FieldReport> {
        self.fields.iter().find(|field| field.source == source)
    }

    pub fn value(&self, source: FieldSource) -> Option<f64> {
        self.field(source).and_then(FieldReport::value)
    }

    pub fn missing(&self) -> Vec<FieldSource> {
        self.fields
            .iter()
            .filter(|field| field.value().is_none())
            .map(|field| field.source)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Every figure arrived and the entry targets were computed.
    pub fn is_actionable(&self) -> bool {
        self.is_complete() && self.valuation.is_some()
    }
}

/// Runs analyses against one page driver.
pub struct Analyzer {
    driver: Arc<dyn PageDriver>,
    policy: WaitPolicy,
    sources: SourceSet,
    factors: ValuationFactors,
    mode: ExecutionMode,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        let span = tracing::info_span!(
            "analysis",
            request_id = %request.id,
            ticker = %request.ticker,
            mode = ?self.mode
        );

        async move {
            let started = Instant::now();
            let extractor = self.extractor();
            let (ticker, cancel) = (&request.ticker, &request.cancel);
            let sources = &self.sources;

            let [iv, intrinsic, close] = match self.mode {
                ExecutionMode::Sequential => {
                    let iv = extractor
                        .extract(ticker, &sources.implied_volatility, cancel)
                        .await;
                    let intrinsic = extractor
                        .extract(ticker, &sources.intrinsic_value, cancel)
                        .await;
                    let close = extractor
                        .extract(ticker, &sources.previous_close, cancel)
                        .await;
                    [iv, intrinsic, close]
                }
                ExecutionMode::Concurrent => {
                    let (iv, intrinsic, close) = tokio::join!(
                        extractor.extract(ticker, &sources.implied_volatility, cancel),
                        extractor.extract(ticker, &sources.intrinsic_value, cancel),
                        extractor.extract(ticker, &sources.previous_close, cancel),
                    );
                    [iv, intrinsic, close]
                }
            };

            let fields = [
                (&self.sources.implied_volatility, iv),
                (&self.sources.intrinsic_value, intrinsic),
                (&self.sources.previous_close, close),
            ]
            .into_iter()
            .map(|(config, result)| FieldReport::from_result(config.url_for(&request.ticker), result))
            .collect::<Vec<_>>();

            let (valuation, skipped) = match self.valuate(&fields) {
                Ok(output) => (Some(output), None),
                Err(reason) => {
                    warn!(%reason, "valuation skipped");
                    (None, Some(reason))
                }
            };

            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            info!(
                latency_ms,
                complete = skipped.is_none(),
                "analysis finished"
            );

            AnalysisReport {
                request_id: request.id,
                ticker: request.ticker.clone(),
                generated_at: UtcDateTime::now(),
                mode: self.mode,
                driver: self.driver.name().to_owned(),
                fields,
                valuation,
                valuation_skipped_reason: skipped,
                latency_ms,
            }
        }
        .instrument(span)
        .await
    }

    fn extractor(&self) -> FieldExtractor<'_> {
        FieldExtractor::new(self.driver.as_ref(), self.policy)
    }

    fn valuate(&self, fields: &[FieldReport]) -> Result<ValuationOutput, SkipReason> {
        let value = |source: FieldSource| {
            fields
                .iter()
                .find(|field| field.source == source)
                .and_then(FieldReport::value)
        };

        match (
            value(FieldSource::ImpliedVolatility),
            value(FieldSource::IntrinsicValue),
            value(FieldSource::PreviousClose),
        ) {
            (Some(iv), Some(intrinsic), Some(close)) => {
                let inputs = ValuationInputs::new(iv, intrinsic, close).map_err(|error| {
                    SkipReason::InvalidInputs {
                        message: error.to_string(),
                    }
                })?;
                Ok(self.factors.combine(&inputs))
            }
            _ => Err(SkipReason::MissingFields {
                fields: fields
                    .iter()
                    .filter(|field| field.value().is_none())
                    .map(|field| field.source)
                    .collect(),
            }),
        }
    }
}

/// Builder for an [`Analyzer`].
///
/// ```rust,ignore
/// use lowbang_core::{AnalyzerBuilder, AnalyzerConfig};
///
/// // Production: Chromium plus whatever LOWBANG_* variables are set.
/// let analyzer = AnalyzerBuilder::new()
///     .with_config(AnalyzerConfig::from_env()?)
///     .build()?;
///
/// // Offline fixtures, no browser.
/// let mock = AnalyzerBuilder::new().with_mock_mode().build()?;
/// ```
#[derive(Default)]
pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
    driver: Option<Arc<dyn PageDriver>>,
    sources: Option<SourceSet>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the canned fixture pages instead of a browser.
    pub fn with_mock_mode(mut self) -> Self {
        self.config.driver = DriverKind::Mock;
        self
    }

    /// Use `driver` regardless of the configured [`DriverKind`].
    pub fn with_driver(mut self, driver: Arc<dyn PageDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sources(mut self, sources: SourceSet) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.config.wait_timeout_ms = duration_ms(policy.timeout);
        self.config.poll_interval_ms = duration_ms(policy.poll_interval);
        self.config.navigation_timeout_ms = duration_ms(policy.navigation_timeout);
        self
    }

    pub fn with_factors(mut self, factors: ValuationFactors) -> Self {
        self.config.factors = factors;
        self
    }

    pub fn build(self) -> Result<Analyzer, ValidationError> {
        self.config.validate()?;
        let policy = self.config.wait_policy();
        let driver = match self.driver {
            Some(driver) => driver,
            None => driver_for(&self.config),
        };

        Ok(Analyzer {
            driver,
            policy,
            sources: self.sources.unwrap_or_default(),
            factors: self.config.factors,
            mode: self.config.mode,
        })
    }
}

fn driver_for(config: &AnalyzerConfig) -> Arc<dyn PageDriver> {
    let navigation_timeout = config.wait_policy().navigation_timeout;
    match config.driver {
        DriverKind::Chromium => Arc::new(ChromiumDriver::new(ChromiumOptions {
            headed: config.headed,
            executable: config.chrome_path.clone(),
            no_sandbox: config.no_sandbox,
            request_timeout: navigation_timeout,
        })),
        DriverKind::Static => Arc::new(StaticHtmlDriver::new(navigation_timeout)),
        DriverKind::Mock => Arc::new(ScriptedDriver::fixtures()),
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
