use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PropertyFinanceError;
use crate::PropertyFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 10.7x gross rent)
pub type Multiple = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Convert a decimal rate to a percentage (0.0534 -> 5.34).
pub fn to_percent(rate: Rate) -> Decimal {
    rate * Decimal::ONE_HUNDRED
}

// ---------------------------------------------------------------------------
// Shared input checks
// ---------------------------------------------------------------------------

pub(crate) fn require_fraction(field: &str, value: Rate) -> PropertyFinanceResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(PropertyFinanceError::invalid(
            field,
            format!("must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: Money) -> PropertyFinanceResult<()> {
    if value < Decimal::ZERO {
        return Err(PropertyFinanceError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: Money) -> PropertyFinanceResult<()> {
    if value <= Decimal::ZERO {
        return Err(PropertyFinanceError::invalid(
            field,
            format!("must be positive, got {value}"),
        ));
    }
    Ok(())
}

/// Discount and growth rates must stay above -100%.
pub(crate) fn require_rate_above_minus_one(field: &str, value: Rate) -> PropertyFinanceResult<()> {
    if value <= -Decimal::ONE {
        return Err(PropertyFinanceError::invalid(
            field,
            "must be greater than -100%",
        ));
    }
    Ok(())
}
