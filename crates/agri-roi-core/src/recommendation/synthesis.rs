use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AgriRoiError;
use crate::risk::assessment::{RiskAssessment, RiskLevel};
use crate::types::*;
use crate::AgriRoiResult;

const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.001);
const SCENARIO_NPV_OFFSET: Decimal = dec!(1000);
const SCENARIO_NPV_SCALE: Decimal = dec!(2000);

// ---------------------------------------------------------------------------
// Weights and tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationWeights {
    pub economic: Decimal,
    pub scenario: Decimal,
    pub monte_carlo: Decimal,
    pub risk: Decimal,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        Self {
            economic: dec!(0.40),
            scenario: dec!(0.25),
            monte_carlo: dec!(0.20),
            risk: dec!(0.15),
        }
    }
}

impl RecommendationWeights {
    pub fn validate(&self) -> AgriRoiResult<()> {
        let parts = [self.economic, self.scenario, self.monte_carlo, self.risk];
        if parts.iter().any(|w| *w < Decimal::ZERO) {
            return Err(AgriRoiError::invalid(
                "recommendation_weights",
                "Weights must be non-negative",
            ));
        }
        let sum: Decimal = parts.iter().sum();
        if (sum - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AgriRoiError::invalid(
                "recommendation_weights",
                format!("Weights must sum to 1 (got {sum})"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl RecommendationTier {
    pub fn from_score(score: Score) -> Self {
        if score >= dec!(0.8) {
            RecommendationTier::StrongBuy
        } else if score >= dec!(0.6) {
            RecommendationTier::Buy
        } else if score >= dec!(0.4) {
            RecommendationTier::Hold
        } else if score >= dec!(0.2) {
            RecommendationTier::Sell
        } else {
            RecommendationTier::StrongSell
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecommendationTier::StrongBuy => "strong_buy",
            RecommendationTier::Buy => "buy",
            RecommendationTier::Hold => "hold",
            RecommendationTier::Sell => "sell",
            RecommendationTier::StrongSell => "strong_sell",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Everything the synthesizer reads. Built by the aggregate analysis, or by
/// hand in tests with a fixed Monte Carlo probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationInputs {
    pub economic_score: Score,
    pub base_npv: Money,
    pub pessimistic_npv: Money,
    /// Probability-weighted NPV across the three scenarios.
    pub weighted_npv: Money,
    pub irr: Rate,
    pub profitability_index: Decimal,
    pub payback_years: Option<Years>,
    pub discounted_payback_years: Option<Years>,
    pub horizon_years: u32,
    /// Monte Carlo probability of positive NPV, in [0, 1].
    pub probability_positive_npv: f64,
    pub expected_shortfall: f64,
    pub risk: RiskAssessment,
}

/// The four weighted components of the recommendation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationScores {
    pub economic: Score,
    pub scenario: Score,
    pub monte_carlo: Score,
    /// 1 - overall risk.
    pub risk: Score,
    pub total: Score,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentRecommendation {
    pub tier: RecommendationTier,
    pub confidence_score: Score,
    pub scores: RecommendationScores,
    pub risk_level: RiskLevel,
    /// Headline IRR of the base case.
    pub expected_return: Rate,
    pub payback_years: Option<Years>,
    pub key_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub mitigation_strategies: Vec<String>,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Map a weighted scenario NPV onto [0, 1]: -$1,000 or worse scores 0,
/// +$1,000 or better scores 1.
pub fn scenario_score(weighted_npv: Money) -> Score {
    clamp_unit((weighted_npv + SCENARIO_NPV_OFFSET) / SCENARIO_NPV_SCALE)
}

fn probability_score(p: f64) -> Score {
    if !p.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64_retain(p)
        .map(|d| clamp_unit(d.round_dp(6)))
        .unwrap_or(Decimal::ZERO)
}

pub fn score_components(
    inputs: &RecommendationInputs,
    weights: &RecommendationWeights,
) -> RecommendationScores {
    let economic = clamp_unit(inputs.economic_score);
    let scenario = scenario_score(inputs.weighted_npv);
    let monte_carlo = probability_score(inputs.probability_positive_npv);
    let risk = clamp_unit(Decimal::ONE - inputs.risk.overall_risk);
    let total = clamp_unit(
        weights.economic * economic
            + weights.scenario * scenario
            + weights.monte_carlo * monte_carlo
            + weights.risk * risk,
    );
    RecommendationScores {
        economic,
        scenario,
        monte_carlo,
        risk,
        total,
    }
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

fn key_factors(inputs: &RecommendationInputs) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.irr > dec!(0.15) {
        out.push(format!("Strong IRR of {}", fmt_pct(inputs.irr)));
    }
    if inputs.base_npv > Decimal::ZERO {
        out.push(format!(
            "Positive base-case NPV of {}/acre",
            fmt_money(inputs.base_npv)
        ));
    }
    if inputs.profitability_index >= dec!(1.5) {
        out.push(format!(
            "Profitability index of {}",
            inputs.profitability_index.round_dp(2)
        ));
    }
    if inputs.probability_positive_npv >= 0.8 {
        out.push(format!(
            "{:.0}% of simulated outcomes are profitable",
            inputs.probability_positive_npv * 100.0
        ));
    }
    if let Some(years) = inputs.discounted_payback_years {
        if years <= dec!(2) {
            out.push(format!(
                "Investment recovered within {} years on a discounted basis",
                years.round_dp(1)
            ));
        }
    }
    if inputs.economic_score >= dec!(0.7) {
        out.push("Strong overall economic profile".to_string());
    }
    if inputs.risk.risk_level == RiskLevel::Low {
        out.push("Low overall risk".to_string());
    }
    out
}

fn risk_factors(inputs: &RecommendationInputs) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.pessimistic_npv < Decimal::ZERO {
        out.push(format!(
            "Negative NPV in the pessimistic scenario ({}/acre)",
            fmt_money(inputs.pessimistic_npv)
        ));
    }
    if inputs.base_npv <= Decimal::ZERO {
        out.push("Base case does not return its investment".to_string());
    }
    if inputs.probability_positive_npv < 0.5 {
        out.push(format!(
            "Only {:.0}% of simulated outcomes are profitable",
            inputs.probability_positive_npv * 100.0
        ));
    }
    if inputs.expected_shortfall < 0.0 {
        out.push(format!(
            "Average loss in the worst 5% of outcomes is ${:.2}/acre",
            -inputs.expected_shortfall
        ));
    }
    if inputs.risk.weather_risk > dec!(0.5) {
        out.push("High weather exposure".to_string());
    }
    if inputs.risk.market_volatility_risk > dec!(0.3) {
        out.push("Volatile market prices".to_string());
    }
    if inputs.risk.yield_volatility_risk > dec!(0.4) {
        out.push("Unstable yields".to_string());
    }
    let horizon = Decimal::from(inputs.horizon_years);
    if inputs.payback_years.map_or(true, |p| p > horizon) {
        out.push(format!(
            "No payback within the {}-year horizon",
            inputs.horizon_years
        ));
    }
    out
}

fn mitigation_strategies(inputs: &RecommendationInputs) -> Vec<String> {
    let mut out = Vec::new();
    if inputs.risk.risk_level.is_elevated() {
        out.push("Purchase crop insurance".to_string());
        out.push("Diversify across varieties and crops".to_string());
        out.push("Hedge price exposure with forward contracts".to_string());
    }
    if inputs.risk.weather_risk > dec!(0.5) {
        out.push("Favour stress-tolerant varieties or irrigation".to_string());
    }
    if inputs.risk.market_volatility_risk > dec!(0.3) {
        out.push("Put a marketing plan in place before planting".to_string());
    }
    if inputs.risk.yield_volatility_risk > dec!(0.4) {
        out.push("Start with trial acreage".to_string());
    }
    if inputs.pessimistic_npv < Decimal::ZERO {
        out.push("Adopt in stages to limit downside".to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Blend economic, scenario, simulation and risk evidence into a tier and
/// narrative. Pure: equal inputs give equal output.
pub fn synthesize(
    inputs: &RecommendationInputs,
    weights: &RecommendationWeights,
) -> InvestmentRecommendation {
    let scores = score_components(inputs, weights);
    InvestmentRecommendation {
        tier: RecommendationTier::from_score(scores.total),
        confidence_score: scores.total,
        risk_level: inputs.risk.risk_level,
        expected_return: inputs.irr,
        payback_years: inputs.payback_years,
        key_factors: key_factors(inputs),
        risk_factors: risk_factors(inputs),
        mitigation_strategies: mitigation_strategies(inputs),
        scores,
    }
}
