use lowbang_core::{AnalysisRequest, Analyzer, AnalyzerConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::AnalyseArgs;
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(
    args: &AnalyseArgs,
    config: AnalyzerConfig,
    cancel: CancellationToken,
) -> Result<CommandOutput, CliError> {
    let request = AnalysisRequest::for_ticker(&args.ticker)?.with_cancellation(cancel);
    let analyzer = Analyzer::builder().with_config(config).build()?;
    info!(
        ticker = %request.ticker,
        driver = analyzer.driver_name(),
        "ticker is valid, scraping sources"
    );

    let report = analyzer.analyze(&request).await;
    Ok(CommandOutput::Analysis(Box::new(report)))
}
