use lowbang_core::{AnalyzerConfig, ValuationFactors, ValuationInputs, ValuationOutput};
use serde::Serialize;

use crate::cli::CombineArgs;
use crate::error::CliError;

use super::CommandOutput;

#[derive(Debug, Serialize)]
pub struct CombineReport {
    pub inputs: ValuationInputs,
    pub factors: ValuationFactors,
    pub valuation: ValuationOutput,
}

pub fn run(args: &CombineArgs, config: &AnalyzerConfig) -> Result<CommandOutput, CliError> {
    let inputs = ValuationInputs::new(args.iv, args.intrinsic, args.close)?;
    let valuation = config.factors.combine(&inputs);

    Ok(CommandOutput::Combination(CombineReport {
        inputs,
        factors: config.factors,
        valuation,
    }))
}
