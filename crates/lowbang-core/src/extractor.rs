//! Field Extractor: one numeric figure from one web page.
//!
//! Every call acquires its own browser session, waits for the configured
//! element, cleans and parses its text, and releases the session on every exit
//! path. Failures never escape as errors; they come back as an [`Absence`]
//! naming the reason.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::adapters::SourceConfig;
use crate::browser::{Locator, PageDriver, PageSession, SessionErrorKind};
use crate::{CleaningRule, FieldSource, Ticker};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounds on how long one extraction may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// How long to wait for the element after the page has loaded.
    pub timeout: Duration,
    /// Delay between element probes.
    pub poll_interval: Duration,
    /// How long the page itself may take to load.
    pub navigation_timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }
}

/// Why a field has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceReason {
    /// The page loaded but does not contain the element.
    NotFound,
    /// The element was found but its cleaned text is blank.
    Empty,
    /// The cleaned text is not a finite number.
    Unparsable,
    /// Launch, navigation, wait timeout, element or cancellation failure.
    RetrievalFailed,
}

impl AbsenceReason {
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "extract.not_found",
            Self::Empty => "extract.empty",
            Self::Unparsable => "extract.unparsable",
            Self::RetrievalFailed => "extract.retrieval_failed",
        }
    }
}

impl Display for AbsenceReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A successfully extracted figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub source: FieldSource,
    pub value: f64,
    /// Element text before cleaning.
    pub raw_text: String,
    pub latency_ms: u64,
}

/// A field that could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub source: FieldSource,
    pub reason: AbsenceReason,
    pub detail: String,
    /// Offending cleaned text, kept for unparsable values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub latency_ms: u64,
}

impl Display for Absence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.source, self.detail, self.reason.code())
    }
}

impl std::error::Error for Absence {}

pub type ExtractionResult = Result<Extraction, Absence>;

/// Failure produced before the latency and source are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    pub reason: AbsenceReason,
    pub detail: String,
    pub raw_text: Option<String>,
}

impl Miss {
    fn new(reason: AbsenceReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
            raw_text: None,
        }
    }

    fn retrieval(detail: impl Into<String>) -> Self {
        Self::new(AbsenceReason::RetrievalFailed, detail)
    }

    fn into_absence(self, source: FieldSource, latency_ms: u64) -> Absence {
        Absence {
            source,
            reason: self.reason,
            detail: self.detail,
            raw_text: self.raw_text,
            latency_ms,
        }
    }
}

/// Clean raw element text and parse it as a finite number.
pub fn interpret(raw: &str, rule: CleaningRule) -> Result<f64, Miss> {
    let cleaned = rule.apply(raw);
    if cleaned.is_empty() {
        return Err(Miss::new(AbsenceReason::Empty, "element text is empty"));
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) | Err(_) => Err(Miss {
            reason: AbsenceReason::Unparsable,
            detail: format!("could not convert '{cleaned}' to a number"),
            raw_text: Some(cleaned),
        }),
    }
}

/// Owns a session for the duration of one extraction.
///
/// If the extraction future is dropped before [`SessionGuard::release`] runs,
/// the close is handed to the runtime so the browser still shuts down.
struct SessionGuard {
    session: Option<Box<dyn PageSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn PageSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    async fn release(mut self, source: FieldSource) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => debug!(%source, "session released"),
                Err(error) => warn!(%source, %error, "session release reported an error"),
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    let _ = session.close().await;
                });
            }
        }
    }
}

/// Generic "extract a numeric field from a web page" operation.
#[derive(Clone, Copy)]
pub struct FieldExtractor<'d> {
    driver: &'d dyn PageDriver,
    policy: WaitPolicy,
}

impl<'d> FieldExtractor<'d> {
    pub fn new(driver: &'d dyn PageDriver, policy: WaitPolicy) -> Self {
        Self { driver, policy }
    }

    /// Extract `config.source` for `ticker`. Never fails; see [`Absence`].
    pub async fn extract(
        &self,
        ticker: &Ticker,
        config: &SourceConfig,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        let source = config.source;
        let url = config.url_for(ticker);
        let span = tracing::info_span!(
            "extract",
            %source,
            %ticker,
            driver = self.driver.name()
        );

        async move {
            let started = Instant::now();
            let outcome = self.run(&url, config, cancel).await;
            let latency_ms = elapsed_ms(started);

            match outcome {
                Ok((raw_text, value)) => {
                    info!(value, latency_ms, "field extracted");
                    Ok(Extraction {
                        source,
                        value,
                        raw_text,
                        latency_ms,
                    })
                }
                Err(miss) => {
                    let absence = miss.into_absence(source, latency_ms);
                    warn!(
                        reason = absence.reason.code(),
                        detail = %absence.detail,
                        raw_text = absence.raw_text.as_deref().unwrap_or(""),
                        "field unavailable"
                    );
                    Err(absence)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        url: &str,
        config: &SourceConfig,
        cancel: &CancellationToken,
    ) -> Result<(String, f64), Miss> {
        if cancel.is_cancelled() {
            return Err(Miss::retrieval("cancelled"));
        }

        let session = self
            .driver
            .open()
            .await
            .map_err(|error| Miss::retrieval(format!("could not open browser session: {error}")))?;
        let mut guard = SessionGuard::new(session);

        let fetched = match guard.session.as_deref_mut() {
            Some(session) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Miss::retrieval("cancelled")),
                    fetched = self.fetch_text(session, url, &config.locator) => fetched,
                }
            }
            None => Err(Miss::retrieval("session already released")),
        };

        guard.release(config.source).await;

        let raw = fetched?;
        let value = interpret(&raw, config.cleaning)?;
        Ok((raw, value))
    }

    async fn fetch_text(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        locator: &Locator,
    ) -> Result<String, Miss> {
        debug!(url, "navigating");
        match tokio::time::timeout(self.policy.navigation_timeout, session.navigate(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(Miss::retrieval(error.to_string())),
            Err(_) => {
                return Err(Miss::retrieval(format!(
                    "page did not load within {}ms",
                    self.policy.navigation_timeout.as_millis()
                )))
            }
        }

        self.wait_for_text(session, locator).await
    }

    async fn wait_for_text(
        &self,
        session: &mut dyn PageSession,
        locator: &Locator,
    ) -> Result<String, Miss> {
        let deadline = Instant::now() + self.policy.timeout;
        let mut probes = 0_u32;

        loop {
            probes += 1;
            match session.probe_text(locator).await {
                Ok(Some(text)) => {
                    debug!(probes, "element present");
                    return Ok(text);
                }
                Ok(None) => {}
                Err(error) if error.kind() == SessionErrorKind::NotFound => {
                    return Err(Miss::new(AbsenceReason::NotFound, error.to_string()));
                }
                Err(error) => return Err(Miss::retrieval(error.to_string())),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Miss::retrieval(format!(
                    "timed out after {}ms waiting for '{locator}'",
                    self.policy.timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.policy.poll_interval.min(deadline - now)).await;
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cleaned_numbers() {
        assert_eq!(interpret("24.5%IV", CleaningRule::Percent), Ok(24.5));
        assert_eq!(interpret(" 1,234.50 ", CleaningRule::Grouped), Ok(1234.5));
        assert_eq!(interpret("182.40 USD", CleaningRule::Currency), Ok(182.4));
    }

    #[test]
    fn blank_text_is_empty_not_zero() {
        let miss = interpret("  USD ", CleaningRule::Currency).expect_err("blank");
        assert_eq!(miss.reason, AbsenceReason::Empty);
        assert_eq!(miss.raw_text, None);
    }

    #[test]
    fn non_numeric_text_is_unparsable_and_preserved() {
        let miss = interpret("N/A", CleaningRule::Grouped).expect_err("not a number");
        assert_eq!(miss.reason, AbsenceReason::Unparsable);
        assert_eq!(miss.raw_text.as_deref(), Some("N/A"));
    }

    #[test]
    fn non_finite_numbers_are_unparsable() {
        for raw in ["NaN", "inf", "-infinity"] {
            let miss = interpret(raw, CleaningRule::Grouped).expect_err("non-finite");
            assert_eq!(miss.reason, AbsenceReason::Unparsable, "{raw}");
        }
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(AbsenceReason::NotFound.code(), "extract.not_found");
        assert_eq!(AbsenceReason::Empty.code(), "extract.empty");
        assert_eq!(AbsenceReason::Unparsable.code(), "extract.unparsable");
        assert_eq!(AbsenceReason::RetrievalFailed.code(), "extract.retrieval_failed");
    }
}
