use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// The three numeric signals an analysis collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    ImpliedVolatility,
    IntrinsicValue,
    PreviousClose,
}

impl FieldSource {
    pub const ALL: [Self; 3] = [
        Self::ImpliedVolatility,
        Self::IntrinsicValue,
        Self::PreviousClose,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImpliedVolatility => "implied_volatility",
            Self::IntrinsicValue => "intrinsic_value",
            Self::PreviousClose => "previous_close",
        }
    }

    /// Human-readable name used in report lines.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ImpliedVolatility => "Implied volatility",
            Self::IntrinsicValue => "Intrinsic value",
            Self::PreviousClose => "Previous close",
        }
    }
}

impl Display for FieldSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldSource {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "implied_volatility" | "iv" => Ok(Self::ImpliedVolatility),
            "intrinsic_value" => Ok(Self::IntrinsicValue),
            "previous_close" => Ok(Self::PreviousClose),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
