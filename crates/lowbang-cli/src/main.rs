mod cli;
mod commands;
mod error;
mod output;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Completion;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            if is_ticker_error(&error) {
                eprintln!("Ticker symbol does not seem valid. Try again.");
            }
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<u8, CliError> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling analysis");
            on_interrupt.cancel();
        }
    });

    let output = commands::run(cli, cancel).await?;
    output::render(&output, cli.format, cli.pretty)?;

    exit_status(output.completion(), cli.strict)
}

/// An analysis without entry targets exits 3, or fails outright under `--strict`.
fn exit_status(completion: Completion, strict: bool) -> Result<u8, CliError> {
    match completion {
        Completion::Complete => Ok(0),
        Completion::Incomplete { missing } if strict => {
            Err(CliError::StrictModeViolation { missing })
        }
        Completion::Incomplete { missing } => {
            info!(missing, "analysis incomplete");
            Ok(3)
        }
    }
}

/// Logs go to stderr so `--format json` output stays machine-readable.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in [format!("lowbang={level}"), format!("lowbang_core={level}")] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn is_ticker_error(error: &CliError) -> bool {
    use lowbang_core::ValidationError;

    matches!(
        error,
        CliError::Validation(
            ValidationError::EmptyTicker
                | ValidationError::TickerTooLong { .. }
                | ValidationError::InvalidTicker { .. }
        )
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use clap::Parser;
    use lowbang_core::{
        AnalysisRequest, AnalyzerBuilder, PageScript, ScriptedDriver, SkipReason, WaitPolicy,
    };

    use super::*;
    use crate::commands::CommandOutput;

    async fn analysis_with_intrinsic(intrinsic: &str) -> CommandOutput {
        let driver = ScriptedDriver::new()
            .with_page("optioncharts.io", PageScript::text("24.5%IV"))
            .with_page("alphaspread.com", PageScript::text(intrinsic))
            .with_page("finance.yahoo.com", PageScript::text("227.48"));
        let analyzer = AnalyzerBuilder::new()
            .with_driver(Arc::new(driver))
            .with_wait_policy(WaitPolicy {
                timeout: Duration::from_millis(50),
                poll_interval: Duration::from_millis(5),
                navigation_timeout: Duration::from_millis(200),
            })
            .build()
            .expect("valid analyzer");
        let report = analyzer
            .analyze(&AnalysisRequest::for_ticker("AAPL").expect("valid"))
            .await;
        CommandOutput::Analysis(Box::new(report))
    }

    #[tokio::test]
    async fn mock_analysis_exits_zero() {
        let cli = Cli::try_parse_from(["lowbang", "--mock", "--format", "json", "analyse", "AAPL"])
            .expect("valid args");

        let code = run(&cli).await.expect("run succeeds");

        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn rejected_valuation_inputs_exit_three() {
        // Given: All three figures arrive but the intrinsic value is negative
        let output = analysis_with_intrinsic("-12.30 USD").await;
        let CommandOutput::Analysis(report) = &output else {
            panic!("analysis output");
        };
        assert!(report.missing().is_empty());
        assert!(matches!(
            report.valuation_skipped_reason,
            Some(SkipReason::InvalidInputs { .. })
        ));

        // When: The exit status is decided
        let completion = output.completion();

        // Then: The run counts as incomplete
        assert_eq!(completion, Completion::Incomplete { missing: 0 });
        assert_eq!(exit_status(completion, false).expect("not strict"), 3);
    }

    #[tokio::test]
    async fn rejected_valuation_inputs_fail_strict_mode() {
        let output = analysis_with_intrinsic("-12.30 USD").await;

        let error = exit_status(output.completion(), true).expect_err("strict");

        assert!(matches!(error, CliError::StrictModeViolation { missing: 0 }));
        assert_eq!(error.exit_code(), 5);
    }

    #[tokio::test]
    async fn missing_figure_exits_three_or_five() {
        let output = analysis_with_intrinsic("").await;

        assert_eq!(output.completion(), Completion::Incomplete { missing: 1 });
        assert_eq!(exit_status(output.completion(), false).expect("not strict"), 3);
        assert_eq!(
            exit_status(output.completion(), true)
                .expect_err("strict")
                .exit_code(),
            5
        );
    }

    #[tokio::test]
    async fn complete_analysis_exits_zero_even_when_strict() {
        let output = analysis_with_intrinsic("182.40 USD").await;

        assert_eq!(output.completion(), Completion::Complete);
        assert_eq!(exit_status(output.completion(), true).expect("complete"), 0);
    }
}
