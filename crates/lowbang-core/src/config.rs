//! Run configuration.
//!
//! Defaults are overlaid with `LOWBANG_*` environment variables by
//! [`AnalyzerConfig::from_env`]; the CLI applies its flags last.
//!
//! | Env Var | Default |
//! |---------|---------|
//! | `LOWBANG_DRIVER` | `chromium` |
//! | `LOWBANG_WAIT_TIMEOUT_MS` | `20000` |
//! | `LOWBANG_POLL_INTERVAL_MS` | `250` |
//! | `LOWBANG_NAVIGATION_TIMEOUT_MS` | `30000` |
//! | `LOWBANG_CONCURRENT` | `false` |
//! | `LOWBANG_HEADED` | `false` |
//! | `LOWBANG_NO_SANDBOX` | `false` |
//! | `LOWBANG_CHROME_PATH` | auto-detect |
//! | `LOWBANG_MARGIN_OF_SAFETY` | `0.8` |
//! | `LOWBANG_VOLATILITY_DAMPING` | `0.5` |
//! | `LOWBANG_ENTRY_MULTIPLIER` | `1.35` |

use std::env;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extractor::{
    WaitPolicy, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
use crate::valuation::ValuationFactors;
use crate::ValidationError;

/// Page engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Chromium,
    Static,
    Mock,
}

impl DriverKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Static => "static",
            Self::Mock => "mock",
        }
    }
}

impl Display for DriverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "static" | "http" => Ok(Self::Static),
            "mock" => Ok(Self::Mock),
            _ => Err(ValidationError::InvalidConfig {
                key: "LOWBANG_DRIVER",
                value: value.to_owned(),
            }),
        }
    }
}

/// How the three extractions of one analysis are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Concurrent,
}

/// Everything an [`Analyzer`](crate::Analyzer) needs besides the sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub driver: DriverKind,
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub navigation_timeout_ms: u64,
    pub mode: ExecutionMode,
    pub headed: bool,
    pub no_sandbox: bool,
    pub chrome_path: Option<PathBuf>,
    pub factors: ValuationFactors,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Chromium,
            wait_timeout_ms: duration_ms(DEFAULT_WAIT_TIMEOUT),
            poll_interval_ms: duration_ms(DEFAULT_POLL_INTERVAL),
            navigation_timeout_ms: duration_ms(DEFAULT_NAVIGATION_TIMEOUT),
            mode: ExecutionMode::Sequential,
            headed: false,
            no_sandbox: false,
            chrome_path: None,
            factors: ValuationFactors::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Overlay values from `lookup`, which maps an env var name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(value) = lookup("LOWBANG_DRIVER") {
            self.driver = value.parse()?;
        }
        if let Some(value) = lookup("LOWBANG_WAIT_TIMEOUT_MS") {
            self.wait_timeout_ms = parse_value("LOWBANG_WAIT_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_value("LOWBANG_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_NAVIGATION_TIMEOUT_MS") {
            self.navigation_timeout_ms = parse_value("LOWBANG_NAVIGATION_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_CONCURRENT") {
            self.mode = if parse_flag("LOWBANG_CONCURRENT", &value)? {
                ExecutionMode::Concurrent
            } else {
                ExecutionMode::Sequential
            };
        }
        if let Some(value) = lookup("LOWBANG_HEADED") {
            self.headed = parse_flag("LOWBANG_HEADED", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_NO_SANDBOX") {
            self.no_sandbox = parse_flag("LOWBANG_NO_SANDBOX", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_CHROME_PATH") {
            if !value.trim().is_empty() {
                self.chrome_path = Some(PathBuf::from(value.trim()));
            }
        }
        if let Some(value) = lookup("LOWBANG_MARGIN_OF_SAFETY") {
            self.factors.margin_of_safety = parse_value("LOWBANG_MARGIN_OF_SAFETY", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_VOLATILITY_DAMPING") {
            self.factors.volatility_damping = parse_value("LOWBANG_VOLATILITY_DAMPING", &value)?;
        }
        if let Some(value) = lookup("LOWBANG_ENTRY_MULTIPLIER") {
            self.factors.realistic_entry_multiplier =
                parse_value("LOWBANG_ENTRY_MULTIPLIER", &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.wait_timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                key: "wait_timeout_ms",
                value: String::from("0"),
            });
        }
        if self.navigation_timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                key: "navigation_timeout_ms",
                value: String::from("0"),
            });
        }
        self.factors.validate()
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: Duration::from_millis(self.wait_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidConfig {
            key,
            value: value.to_owned(),
        })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ValidationError::InvalidConfig {
            key,
            value: value.to_owned(),
        }),
    }
}
