use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::config::AnalysisConfig;
use crate::economics::viability::validate_request;
use crate::error::AgriRoiError;
use crate::inputs::{RegionalContext, VarietyAttributes};
use crate::types::*;
use crate::AgriRoiResult;

const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.001);

// ---------------------------------------------------------------------------
// Weights and levels
// ---------------------------------------------------------------------------

/// Blend weights for the overall risk score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    pub weather: Decimal,
    pub market: Decimal,
    pub yield_volatility: Decimal,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            weather: dec!(0.4),
            market: dec!(0.3),
            yield_volatility: dec!(0.3),
        }
    }
}

impl RiskWeights {
    pub fn validate(&self) -> AgriRoiResult<()> {
        let parts = [self.weather, self.market, self.yield_volatility];
        if parts.iter().any(|w| *w < Decimal::ZERO) {
            return Err(AgriRoiError::invalid(
                "risk_weights",
                "Weights must be non-negative",
            ));
        }
        let sum: Decimal = parts.iter().sum();
        if (sum - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AgriRoiError::invalid(
                "risk_weights",
                format!("Weights must sum to 1 (got {sum})"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn classify(overall: Score) -> Self {
        if overall <= dec!(0.3) {
            RiskLevel::Low
        } else if overall <= dec!(0.5) {
            RiskLevel::Medium
        } else if overall <= dec!(0.7) {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::VeryHigh)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Component scores
// ---------------------------------------------------------------------------

/// Regional weather baseline reduced by tolerance traits and stability.
pub fn weather_risk(variety: &VarietyAttributes, region: &RegionalContext) -> Score {
    let mut risk = region.weather_risk;
    if variety.drought_tolerant {
        risk -= dec!(0.10);
    }
    if variety.heat_tolerant {
        risk -= dec!(0.05);
    }
    risk -= dec!(0.02) * (variety.yield_stability_rating - dec!(5));
    clamp_unit(risk)
}

/// Regional price volatility adjusted for market acceptance.
///
/// Acceptance above 4.0 lowers risk by 0.05 but also flags a premium market,
/// which carries its own 0.03 exposure, for a net -0.02.
pub fn market_volatility_risk(variety: &VarietyAttributes, region: &RegionalContext) -> Score {
    let mut risk = region.price_volatility;
    let acceptance = variety.market_acceptance_score;
    if acceptance > dec!(4.0) {
        risk -= dec!(0.05);
        risk += dec!(0.03);
    } else if acceptance < dec!(2.0) {
        risk += dec!(0.05);
    }
    clamp_unit(risk)
}

pub fn yield_volatility_risk(variety: &VarietyAttributes, region: &RegionalContext) -> Score {
    let mut risk = Decimal::ONE - variety.yield_stability_rating / dec!(10);
    if variety.disease_resistance_count > 5 {
        risk -= dec!(0.1);
    } else if variety.disease_resistance_count < 2 {
        risk += dec!(0.1);
    }
    risk += region.yield_volatility_adjustment;
    clamp_unit(risk)
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub weather_risk: Score,
    pub market_volatility_risk: Score,
    pub yield_volatility_risk: Score,
    pub overall_risk: Score,
    pub risk_level: RiskLevel,
}

/// Combine the three component risks with `weights` and classify the result.
pub fn assess_risk(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    weights: &RiskWeights,
) -> RiskAssessment {
    let weather = weather_risk(variety, region);
    let market = market_volatility_risk(variety, region);
    let yield_vol = yield_volatility_risk(variety, region);
    let overall = clamp_unit(
        weights.weather * weather + weights.market * market + weights.yield_volatility * yield_vol,
    );

    RiskAssessment {
        weather_risk: weather,
        market_volatility_risk: market,
        yield_volatility_risk: yield_vol,
        overall_risk: overall,
        risk_level: RiskLevel::classify(overall),
    }
}

pub fn run_risk_assessment(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    config: &AnalysisConfig,
) -> AgriRoiResult<ComputationOutput<RiskAssessment>> {
    let start = Instant::now();
    validate_request(variety, region, config)?;

    let assessment = assess_risk(variety, region, &config.risk_weights);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weighted Weather / Market / Yield Risk Composite",
        &serde_json::json!({
            "weights": config.risk_weights,
            "levels": { "low": "<= 0.3", "medium": "<= 0.5", "high": "<= 0.7" },
            "region": region.region_name,
        }),
        Vec::new(),
        elapsed,
        assessment,
    ))
}
