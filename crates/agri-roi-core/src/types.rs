use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values (per acre unless stated). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.08 = 8%). Never as percentages.
pub type Rate = Decimal;

/// Normalised score in [0, 1].
pub type Score = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Symmetric or percentile-based interval around an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval<T> {
    pub lower: T,
    pub upper: T,
}

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

/// Clamp a score into [0, 1].
pub fn clamp_unit(x: Decimal) -> Score {
    clamp(x, Decimal::ZERO, Decimal::ONE)
}

pub fn clamp(x: Decimal, lo: Decimal, hi: Decimal) -> Decimal {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// Render a rate as a percentage string with one decimal place ("12.5%").
pub fn fmt_pct(rate: Rate) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(1))
}

/// Render money rounded to cents.
pub fn fmt_money(amount: Money) -> String {
    format!("${}", amount.round_dp(2))
}
