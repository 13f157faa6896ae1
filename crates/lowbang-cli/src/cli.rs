//! CLI argument definitions for Lowbang.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyse` | Scrape the three figures and suggest entry prices |
//! | `combine` | Run the valuation arithmetic on figures you supply |
//! | `sources` | List the pages and locators each figure comes from |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--driver` | `chromium` | Page engine (chromium, static, mock) |
//! | `--timeout-ms` | `20000` | Wait for each element at most this long |
//! | `--concurrent` | `false` | Scrape the three pages at once |
//! | `--headed` | `false` | Show the browser window |
//! | `--mock` | `false` | Use canned pages, no network |
//! | `--strict` | `false` | Any missing figure fails with exit code 5 |
//! | `-v` | off | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! lowbang analyse AAPL
//! lowbang analyse BRK-B --concurrent --format json --pretty
//! lowbang combine --iv 20 --intrinsic 100 --close 50
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use lowbang_core::DriverKind;

/// Lowbang - entry-price analysis for a stock ticker
///
/// Reads 30-day implied volatility, intrinsic value and previous close from
/// public pages and turns them into suggested entry ranges.
#[derive(Debug, Parser)]
#[command(
    name = "lowbang",
    author,
    version,
    about = "Entry-price analysis for a stock ticker",
    long_about = "Lowbang drives a browser to read three figures for a ticker:\n\
\n\
  • 30-day implied volatility (optioncharts.io)\n\
  • Intrinsic value (alphaspread.com)\n\
  • Previous close (finance.yahoo.com)\n\
\n\
and combines them into a volatility range, an intrinsic-value range and a \
realistic entry price.\n\
\n\
Use 'lowbang <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Page engine. Overrides LOWBANG_DRIVER.
    #[arg(long, global = true, value_enum)]
    pub driver: Option<DriverArg>,

    /// Element wait budget in milliseconds. Overrides LOWBANG_WAIT_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Scrape the three pages concurrently.
    #[arg(long, global = true, default_value_t = false)]
    pub concurrent: bool,

    /// Show the browser window (chromium driver only).
    #[arg(long, global = true, default_value_t = false)]
    pub headed: bool,

    /// Use canned fixture pages instead of the network. Same as `--driver mock`.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Treat any missing figure as a failure (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable sentences.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriverArg {
    /// Headless Chrome via the DevTools protocol.
    Chromium,
    /// Plain HTTP fetch, no JavaScript.
    Static,
    /// Canned fixture pages.
    Mock,
}

impl From<DriverArg> for DriverKind {
    fn from(value: DriverArg) -> Self {
        match value {
            DriverArg::Chromium => Self::Chromium,
            DriverArg::Static => Self::Static,
            DriverArg::Mock => Self::Mock,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape all three figures for a ticker and suggest entry prices.
    ///
    /// # Examples
    ///
    ///   lowbang analyse AAPL
    ///   lowbang analyse MSFT --driver static
    #[command(visible_alias = "analyze")]
    Analyse(AnalyseArgs),

    /// Combine figures you already have, without scraping.
    ///
    /// # Examples
    ///
    ///   lowbang combine --iv 24.5 --intrinsic 182.40 --close 227.48
    Combine(CombineArgs),

    /// List the source pages, locators and cleaning rules.
    Sources,
}

/// Arguments for the `analyse` command.
#[derive(Debug, Args)]
pub struct AnalyseArgs {
    /// Uppercase ticker symbol, e.g. AAPL or BRK-B.
    pub ticker: String,
}

/// Arguments for the `combine` command.
#[derive(Debug, Args)]
pub struct CombineArgs {
    /// 30-day implied volatility in percent, e.g. 24.5.
    #[arg(long)]
    pub iv: f64,

    /// Intrinsic value in dollars.
    #[arg(long)]
    pub intrinsic: f64,

    /// Previous close in dollars.
    #[arg(long)]
    pub close: f64,
}
