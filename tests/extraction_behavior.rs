//! Behavior-driven tests for the Field Extractor
//!
//! Every scenario checks what the caller observes (a value or an absence with
//! a reason) and that the browser session acquired for the call was released.

use std::time::Duration;

use lowbang_core::{
    AbsenceReason, CancellationToken, CleaningRule, ElementScript, FieldExtractor, FieldSource,
    Locator, PageScript, ScriptedDriver, SourceConfig, Ticker, WaitPolicy,
};

fn fast_policy() -> WaitPolicy {
    WaitPolicy {
        timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        navigation_timeout: Duration::from_millis(200),
    }
}

fn close_config() -> SourceConfig {
    SourceConfig::new(
        FieldSource::PreviousClose,
        "https://quotes.test/{ticker}",
        Locator::css("span.close"),
        CleaningRule::Grouped,
    )
    .expect("valid config")
}

fn ticker() -> Ticker {
    Ticker::parse("AAPL").expect("valid ticker")
}

// =============================================================================
// Successful extraction
// =============================================================================

#[tokio::test]
async fn figure_with_thousands_separator_is_extracted() {
    // Given: A quote page showing a previous close of 1,234.56
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::text(" 1,234.56 "));
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The previous close is extracted
    let extraction = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect("figure should be present");

    // Then: The cleaned number is returned alongside the raw text
    assert_eq!(extraction.value, 1234.56);
    assert_eq!(extraction.raw_text, " 1,234.56 ");
    assert_eq!(extraction.source, FieldSource::PreviousClose);

    // And: The ticker was substituted into the page URL
    assert_eq!(driver.stats().visited(), vec![String::from("https://quotes.test/AAPL")]);

    // And: The one session opened was closed
    assert_eq!((driver.stats().opened(), driver.stats().closed()), (1, 1));
}

#[tokio::test]
async fn element_rendered_late_is_waited_for() {
    // Given: A page whose figure only appears after a few polls
    let driver = ScriptedDriver::new().with_page(
        "quotes.test",
        PageScript::new(ElementScript::AppearsAfter {
            polls: 3,
            text: String::from("98.10"),
        }),
    );
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let result = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await;

    // Then: The extractor kept polling until it showed up
    assert_eq!(result.map(|extraction| extraction.value), Ok(98.1));
    assert_eq!(driver.stats().open_sessions(), 0);
}

#[tokio::test]
async fn implied_volatility_label_is_stripped() {
    // Given: The optioncharts chart label for AAPL
    let driver = ScriptedDriver::fixtures();
    let extractor = FieldExtractor::new(&driver, fast_policy());
    let config = SourceConfig::default_for(FieldSource::ImpliedVolatility);

    // When: Implied volatility is extracted
    let extraction = extractor
        .extract(&ticker(), &config, &CancellationToken::new())
        .await
        .expect("fixture page carries the label");

    // Then: "24.5%IV" becomes 24.5
    assert_eq!(extraction.value, 24.5);
    assert_eq!(
        driver.stats().visited(),
        vec![String::from("https://optioncharts.io/options/AAPL")]
    );
}

// =============================================================================
// Absence reasons
// =============================================================================

#[tokio::test]
async fn blank_element_is_empty_never_zero() {
    // Given: The element exists but carries only whitespace
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::text("   "));
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("blank text has no value");

    // Then: It is reported as empty rather than as 0.0
    assert_eq!(absence.reason, AbsenceReason::Empty);
    assert_eq!(absence.raw_text, None);
    assert_eq!(driver.stats().open_sessions(), 0);
}

#[tokio::test]
async fn non_numeric_text_is_unparsable_and_kept_for_diagnostics() {
    // Given: The site shows "N/A" instead of a price
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::text("N/A"));
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("N/A is not a number");

    // Then: The reason is unparsable and the offending text is preserved
    assert_eq!(absence.reason, AbsenceReason::Unparsable);
    assert_eq!(absence.raw_text.as_deref(), Some("N/A"));
    assert_eq!(absence.reason.code(), "extract.unparsable");
    assert_eq!(driver.stats().open_sessions(), 0);
}

#[tokio::test]
async fn element_that_never_appears_times_out_as_retrieval_failure() {
    // Given: A page that never renders the figure
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::new(ElementScript::Never));
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted with a 50ms wait budget
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("element never appears");

    // Then: The wait gives up and says so
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert!(absence.detail.contains("timed out after 50ms"), "{}", absence.detail);
    assert_eq!((driver.stats().opened(), driver.stats().closed()), (1, 1));
}

#[tokio::test]
async fn element_missing_from_loaded_page_is_not_found() {
    // Given: A fully loaded page that definitively lacks the element
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::new(ElementScript::Missing));
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("element is missing");

    // Then: The reason is not found, without waiting out the timeout
    assert_eq!(absence.reason, AbsenceReason::NotFound);
    assert!(absence.latency_ms < 50);
    assert_eq!(driver.stats().open_sessions(), 0);
}

#[tokio::test]
async fn unreadable_element_is_retrieval_failure() {
    // Given: The element exists but the engine cannot read it
    let driver = ScriptedDriver::new().with_page(
        "quotes.test",
        PageScript::new(ElementScript::Unreadable(String::from("node detached"))),
    );
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("element unreadable");

    // Then: The failure is reported and the session released
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert!(absence.detail.contains("node detached"));
    assert_eq!(driver.stats().open_sessions(), 0);
}

// =============================================================================
// Session release on failure paths
// =============================================================================

#[tokio::test]
async fn navigation_error_still_releases_session() {
    // Given: A site that refuses the connection
    let driver = ScriptedDriver::new()
        .with_page("quotes.test", PageScript::failing_navigation("connection refused"));
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("navigation fails");

    // Then: It is a retrieval failure and the session was closed
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert!(absence.detail.contains("connection refused"));
    assert_eq!((driver.stats().opened(), driver.stats().closed()), (1, 1));
}

#[tokio::test]
async fn slow_page_load_is_bounded_by_navigation_timeout() {
    // Given: A page that takes far longer to load than allowed
    let driver = ScriptedDriver::new().with_page(
        "quotes.test",
        PageScript::text("10.00").with_navigation_delay(Duration::from_secs(5)),
    );
    let policy = WaitPolicy {
        navigation_timeout: Duration::from_millis(30),
        ..fast_policy()
    };
    let extractor = FieldExtractor::new(&driver, policy);

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("page load times out");

    // Then: The load is abandoned and the session released
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert!(absence.detail.contains("did not load within 30ms"), "{}", absence.detail);
    assert_eq!(driver.stats().open_sessions(), 0);
}

#[tokio::test]
async fn launch_failure_is_absence_not_panic() {
    // Given: No browser can be started
    let driver = ScriptedDriver::new().failing_launch("chrome executable not found");
    let extractor = FieldExtractor::new(&driver, fast_policy());

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &CancellationToken::new())
        .await
        .expect_err("launch fails");

    // Then: The caller gets a retrieval failure and nothing was left open
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert!(absence.detail.contains("chrome executable not found"));
    assert_eq!((driver.stats().opened(), driver.stats().closed()), (0, 0));
}

#[tokio::test]
async fn cancellation_aborts_wait_and_releases_session() {
    // Given: A page that never renders and a generous wait budget
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::new(ElementScript::Never));
    let policy = WaitPolicy {
        timeout: Duration::from_secs(10),
        ..fast_policy()
    };
    let extractor = FieldExtractor::new(&driver, policy);
    let cancel = CancellationToken::new();

    // When: The caller cancels shortly after the extraction starts
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let absence = extractor
        .extract(&ticker(), &close_config(), &cancel)
        .await
        .expect_err("cancelled");

    // Then: The wait ends early with a cancellation and the session is closed
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert_eq!(absence.detail, "cancelled");
    assert!(absence.latency_ms < 5_000);
    assert_eq!((driver.stats().opened(), driver.stats().closed()), (1, 1));
}

#[tokio::test]
async fn cancelled_token_skips_browser_entirely() {
    // Given: A request that was cancelled before extraction began
    let driver = ScriptedDriver::fixtures();
    let extractor = FieldExtractor::new(&driver, fast_policy());
    let cancel = CancellationToken::new();
    cancel.cancel();

    // When: The figure is extracted
    let absence = extractor
        .extract(&ticker(), &close_config(), &cancel)
        .await
        .expect_err("cancelled");

    // Then: No session was ever opened
    assert_eq!(absence.reason, AbsenceReason::RetrievalFailed);
    assert_eq!(driver.stats().opened(), 0);
}

#[tokio::test]
async fn dropped_extraction_releases_session_in_background() {
    // Given: An extraction stuck waiting for an element
    let driver = ScriptedDriver::new().with_page("quotes.test", PageScript::new(ElementScript::Never));
    let policy = WaitPolicy {
        timeout: Duration::from_secs(10),
        ..fast_policy()
    };
    let extractor = FieldExtractor::new(&driver, policy);
    let config = close_config();
    let cancel = CancellationToken::new();
    let ticker = ticker();

    // When: The caller stops polling the future altogether
    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        extractor.extract(&ticker, &config, &cancel),
    )
    .await;
    assert!(outcome.is_err(), "extraction should still be waiting");
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Then: The session was closed anyway
    assert_eq!((driver.stats().opened(), driver.stats().closed()), (1, 1));
}

#[tokio::test]
async fn every_exit_path_matches_one_acquisition_with_one_release() {
    // Given: One page per exit path the extractor can take
    let scripts = [
        PageScript::text("12.5"),
        PageScript::text(""),
        PageScript::text("twelve"),
        PageScript::new(ElementScript::Never),
        PageScript::new(ElementScript::Missing),
        PageScript::new(ElementScript::Unreadable(String::from("stale"))),
        PageScript::failing_navigation("dns failure"),
    ];

    for script in scripts {
        let driver = ScriptedDriver::new().with_page("quotes.test", script.clone());
        let extractor = FieldExtractor::new(&driver, fast_policy());

        // When: The figure is extracted
        let _ = extractor
            .extract(&ticker(), &close_config(), &CancellationToken::new())
            .await;

        // Then: Exactly one session was opened and exactly one closed
        let stats = driver.stats();
        assert_eq!((stats.opened(), stats.closed()), (1, 1), "{script:?}");
    }
}
