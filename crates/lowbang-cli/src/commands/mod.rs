mod analyse;
mod combine;
mod sources;

use lowbang_core::{AnalysisReport, AnalyzerConfig, DriverKind, ExecutionMode};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub use combine::CombineReport;
pub use sources::SourceListing;

/// What a command hands to the renderer.
#[derive(Debug)]
pub enum CommandOutput {
    Analysis(Box<AnalysisReport>),
    Combination(CombineReport),
    Sources(Vec<SourceListing>),
}

/// Whether a command produced everything it set out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Complete,
    /// No entry targets; `missing` figures were never retrieved.
    Incomplete { missing: usize },
}

impl CommandOutput {
    pub fn completion(&self) -> Completion {
        match self {
            Self::Analysis(report) if !report.is_actionable() => Completion::Incomplete {
                missing: report.missing().len(),
            },
            Self::Analysis(_) | Self::Combination(_) | Self::Sources(_) => Completion::Complete,
        }
    }
}

pub async fn run(cli: &Cli, cancel: CancellationToken) -> Result<CommandOutput, CliError> {
    let config = resolve_config(cli)?;

    match &cli.command {
        Command::Analyse(args) => analyse::run(args, config, cancel).await,
        Command::Combine(args) => combine::run(args, &config),
        Command::Sources => Ok(sources::run()),
    }
}

/// Defaults, then `LOWBANG_*` variables, then flags.
fn resolve_config(cli: &Cli) -> Result<AnalyzerConfig, CliError> {
    let mut config = AnalyzerConfig::from_env()?;

    if let Some(driver) = cli.driver {
        config.driver = driver.into();
    }
    if cli.mock {
        config.driver = DriverKind::Mock;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.wait_timeout_ms = timeout_ms;
    }
    if cli.concurrent {
        config.mode = ExecutionMode::Concurrent;
    }
    if cli.headed {
        config.headed = true;
    }

    config.validate()?;
    Ok(config)
}
