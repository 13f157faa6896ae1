use std::io::{self, Write};

use lowbang_core::{
    AnalysisReport, FieldOutcome, FieldReport, FieldSource, Ticker, ValuationOutput,
};

use crate::cli::OutputFormat;
use crate::commands::{CombineReport, CommandOutput, SourceListing};
use crate::error::CliError;

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_output(&mut out, output, format, pretty)?;
    out.flush()?;
    Ok(())
}

pub fn write_output<W: Write>(
    out: &mut W,
    output: &CommandOutput,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = match output {
                CommandOutput::Analysis(report) => to_json(&**report, pretty)?,
                CommandOutput::Combination(report) => to_json(report, pretty)?,
                CommandOutput::Sources(listings) => to_json(listings, pretty)?,
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => match output {
            CommandOutput::Analysis(report) => write_analysis(out, report)?,
            CommandOutput::Combination(report) => write_combination(out, report)?,
            CommandOutput::Sources(listings) => write_sources(out, listings)?,
        },
    }

    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(payload)
}

fn write_analysis<W: Write>(out: &mut W, report: &AnalysisReport) -> io::Result<()> {
    for field in &report.fields {
        write_field(out, &report.ticker, field)?;
    }

    match (&report.valuation, &report.valuation_skipped_reason) {
        (Some(valuation), _) => write_valuation(out, valuation)?,
        (None, Some(reason)) => writeln!(out, "Entry targets were not calculated ({reason}).")?,
        (None, None) => {}
    }

    writeln!(out)?;
    writeln!(out, "request_id  : {}", report.request_id)?;
    writeln!(out, "generated_at: {}", report.generated_at)?;
    writeln!(out, "driver      : {}", report.driver)?;
    writeln!(out, "latency_ms  : {}", report.latency_ms)?;
    Ok(())
}

fn write_field<W: Write>(out: &mut W, ticker: &Ticker, field: &FieldReport) -> io::Result<()> {
    match &field.outcome {
        FieldOutcome::Present { value, .. } => match field.source {
            FieldSource::ImpliedVolatility => writeln!(
                out,
                "The 30-Day implied volatility for {ticker} is {value}%"
            ),
            FieldSource::IntrinsicValue => {
                writeln!(out, "The Intrinsic Value for {ticker} is ${value:.2}")
            }
            FieldSource::PreviousClose => {
                writeln!(out, "The Previous Close for {ticker} is ${value:.2}")
            }
        },
        FieldOutcome::Absent {
            reason,
            detail,
            raw_text,
        } => {
            writeln!(out, "{} could not be retrieved.", display_name(field.source))?;
            writeln!(out, "  {}: {detail}", reason.code())?;
            if let Some(raw_text) = raw_text {
                writeln!(out, "  Element text was: '{raw_text}'")?;
            }
            Ok(())
        }
    }
}

fn display_name(source: FieldSource) -> &'static str {
    match source {
        FieldSource::ImpliedVolatility => "Implied volatility",
        FieldSource::IntrinsicValue => "Intrinsic Value",
        FieldSource::PreviousClose => "Previous Close",
    }
}

fn write_valuation<W: Write>(out: &mut W, valuation: &ValuationOutput) -> io::Result<()> {
    writeln!(
        out,
        "Entry target range within the next 30 days based on daily volatility would be from: ${:.2} to ${:.2}",
        valuation.lower_bound, valuation.upper_bound
    )?;
    writeln!(
        out,
        "Entry target range within the next 30 days based on intrinsic value would be from: ${:.2} to ${:.2}",
        valuation.adjusted_price, valuation.margin_of_safety_price
    )?;
    writeln!(
        out,
        "A suggested realistic entry price if a market correction were to happen could be around: ${:.2} or lower.",
        valuation.realistic_entry_price
    )
}

fn write_combination<W: Write>(out: &mut W, report: &CombineReport) -> io::Result<()> {
    writeln!(
        out,
        "inputs      : iv={}% intrinsic=${:.2} close=${:.2}",
        report.inputs.implied_volatility_percent,
        report.inputs.intrinsic_value,
        report.inputs.previous_close
    )?;
    writeln!(
        out,
        "daily_iv    : {:.6}",
        report.valuation.daily_implied_volatility
    )?;
    write_valuation(out, &report.valuation)
}

fn write_sources<W: Write>(out: &mut W, listings: &[SourceListing]) -> io::Result<()> {
    for listing in listings {
        writeln!(out, "{} ({})", listing.label, listing.source)?;
        writeln!(out, "  url     : {}", listing.url_template)?;
        writeln!(out, "  selector: {}", listing.selector)?;
        writeln!(out, "  cleaning: {}", listing.cleaning.as_str())?;
    }
    Ok(())
}
