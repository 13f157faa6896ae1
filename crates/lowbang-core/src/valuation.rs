//! Valuation Combiner.
//!
//! Pure arithmetic turning implied volatility, intrinsic value and previous
//! close into two entry ranges and one suggested entry price:
//!
//! ```text
//! iv               = iv_percent / 100
//! daily_iv         = iv / sqrt(horizon_days)
//! margin_of_safety = intrinsic * margin_of_safety_factor
//! adjusted         = margin_of_safety - intrinsic * daily_iv * volatility_damping
//! lower, upper     = previous_close * (1 -/+ daily_iv)
//! realistic_entry  = min(upper, margin_of_safety) * realistic_entry_multiplier
//! ```

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Share of intrinsic value treated as a conservative buy price.
pub const MARGIN_OF_SAFETY: f64 = 0.8;
/// Fraction of daily volatility subtracted from the margin-of-safety price.
pub const VOLATILITY_DAMPING: f64 = 0.5;
/// Multiplier applied to the lower of the two ceilings.
pub const REALISTIC_ENTRY_MULTIPLIER: f64 = 1.35;
/// Horizon the quoted implied volatility covers, in days.
pub const HORIZON_DAYS: u32 = 30;

/// Business constants of the combiner, overridable per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationFactors {
    pub margin_of_safety: f64,
    pub volatility_damping: f64,
    pub realistic_entry_multiplier: f64,
    pub horizon_days: u32,
}

impl Default for ValuationFactors {
    fn default() -> Self {
        Self {
            margin_of_safety: MARGIN_OF_SAFETY,
            volatility_damping: VOLATILITY_DAMPING,
            realistic_entry_multiplier: REALISTIC_ENTRY_MULTIPLIER,
            horizon_days: HORIZON_DAYS,
        }
    }
}

impl ValuationFactors {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_factor("margin_of_safety", self.margin_of_safety)?;
        validate_factor("volatility_damping", self.volatility_damping)?;
        validate_factor("realistic_entry_multiplier", self.realistic_entry_multiplier)?;
        if self.horizon_days == 0 {
            return Err(ValidationError::NonPositiveFactor {
                field: "horizon_days",
            });
        }
        Ok(())
    }

    pub fn combine(&self, inputs: &ValuationInputs) -> ValuationOutput {
        let implied_volatility = inputs.implied_volatility_percent / 100.0;
        let daily_implied_volatility = implied_volatility / f64::from(self.horizon_days).sqrt();
        let margin_of_safety_price = inputs.intrinsic_value * self.margin_of_safety;
        let adjusted_price = margin_of_safety_price
            - inputs.intrinsic_value * daily_implied_volatility * self.volatility_damping;
        let lower_bound = inputs.previous_close * (1.0 - daily_implied_volatility);
        let upper_bound = inputs.previous_close * (1.0 + daily_implied_volatility);
        let realistic_entry_price =
            upper_bound.min(margin_of_safety_price) * self.realistic_entry_multiplier;

        ValuationOutput {
            implied_volatility,
            daily_implied_volatility,
            margin_of_safety_price,
            adjusted_price,
            lower_bound,
            upper_bound,
            realistic_entry_price,
        }
    }
}

fn validate_factor(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveFactor { field });
    }
    Ok(())
}

/// The three figures the combiner needs, all present and sane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// Implied volatility in percent, e.g. `24.5`.
    pub implied_volatility_percent: f64,
    pub intrinsic_value: f64,
    pub previous_close: f64,
}

impl ValuationInputs {
    pub fn new(
        implied_volatility_percent: f64,
        intrinsic_value: f64,
        previous_close: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("implied_volatility", implied_volatility_percent)?;
        validate_non_negative("intrinsic_value", intrinsic_value)?;
        validate_non_negative("previous_close", previous_close)?;

        Ok(Self {
            implied_volatility_percent,
            intrinsic_value,
            previous_close,
        })
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

/// Derived entry figures. Recomputed every run, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutput {
    /// Implied volatility as a decimal fraction.
    pub implied_volatility: f64,
    pub daily_implied_volatility: f64,
    pub margin_of_safety_price: f64,
    pub adjusted_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub realistic_entry_price: f64,
}

/// Combine with the default factors and no input validation.
pub fn combine(iv_percent: f64, intrinsic_value: f64, previous_close: f64) -> ValuationOutput {
    ValuationFactors::default().combine(&ValuationInputs {
        implied_volatility_percent: iv_percent,
        intrinsic_value,
        previous_close,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-3
    }

    #[test]
    fn reference_figures() {
        let out = combine(20.0, 100.0, 50.0);
        assert!(close(out.implied_volatility, 0.2));
        assert!(close(out.daily_implied_volatility, 0.036515));
        assert!(close(out.margin_of_safety_price, 80.0));
        assert!(close(out.adjusted_price, 78.174));
        assert!(close(out.lower_bound, 48.174));
        assert!(close(out.upper_bound, 51.826));
        assert!(close(out.realistic_entry_price, 69.965));
    }

    #[test]
    fn realistic_entry_uses_margin_when_it_is_lower() {
        let out = combine(20.0, 10.0, 50.0);
        assert!(close(out.realistic_entry_price, 8.0 * 1.35));
    }

    #[test]
    fn custom_factors_apply() {
        let factors = ValuationFactors {
            margin_of_safety: 0.7,
            ..ValuationFactors::default()
        };
        let inputs = ValuationInputs::new(20.0, 100.0, 50.0).expect("valid");
        assert!(close(factors.combine(&inputs).margin_of_safety_price, 70.0));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            ValuationInputs::new(f64::NAN, 100.0, 50.0),
            Err(ValidationError::NonFiniteValue {
                field: "implied_volatility"
            })
        );
        assert_eq!(
            ValuationInputs::new(20.0, 100.0, -1.0),
            Err(ValidationError::NegativeValue {
                field: "previous_close"
            })
        );
    }

    #[test]
    fn rejects_bad_factors() {
        let zero = ValuationFactors {
            realistic_entry_multiplier: 0.0,
            ..ValuationFactors::default()
        };
        assert!(zero.validate().is_err());
        let no_horizon = ValuationFactors {
            horizon_days: 0,
            ..ValuationFactors::default()
        };
        assert!(no_horizon.validate().is_err());
        assert!(ValuationFactors::default().validate().is_ok());
    }
}
