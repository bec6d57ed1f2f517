//! Aggregate ROI analysis for one crop variety in one region.
//!
//! Runs the full pipeline: cost/revenue model, deterministic metrics,
//! scenarios and sensitivity, Monte Carlo simulation, risk composite and
//! finally the investment recommendation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, debug_span};

use crate::config::AnalysisConfig;
use crate::economics::cost_revenue::{CostFactors, CostRevenueModel, Multipliers, RevenueFactors};
use crate::economics::metrics::{calculate_metrics, MetricsParams, YearCashFlow};
use crate::economics::viability::{
    assess_viability, profile_warning, validate_request, EconomicViability,
};
use crate::inputs::{FarmerPreferences, RegionalContext, VarietyAttributes};
use crate::monte_carlo::simulation::{simulate_npv, MonteCarloResult};
use crate::recommendation::synthesis::{synthesize, InvestmentRecommendation, RecommendationInputs};
use crate::risk::assessment::{assess_risk, RiskAssessment};
use crate::scenarios::scenario::{evaluate_scenarios, ScenarioSet};
use crate::scenarios::sensitivity::{tornado_analysis, DriverSensitivity};
use crate::types::*;
use crate::AgriRoiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub discount_rate: Rate,
    pub reinvestment_rate: Rate,
    pub monte_carlo_iterations: u32,
    /// Seed actually used by the simulation; rerun with it to reproduce.
    pub seed: u64,
    pub data_sources: Vec<String>,
}

/// Full analysis result for one variety.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SophisticatedRoiAnalysis {
    pub variety_name: String,
    pub crop_name: String,
    pub region_name: String,
    pub horizon_years: u32,

    // Headline metrics (base case)
    pub npv: Money,
    /// Capped simple-return IRR.
    pub irr: Rate,
    /// Root-finding IRR on the flat cash flow, when it converges.
    pub root_irr: Option<Rate>,
    pub mirr: Rate,
    pub profitability_index: Decimal,
    pub payback_years: Option<Years>,
    pub discounted_payback_years: Option<Years>,
    pub break_even_yield: Option<Decimal>,
    pub break_even_price: Option<Money>,

    pub costs: CostFactors,
    pub revenue: RevenueFactors,
    pub cash_flows: Vec<YearCashFlow>,
    pub viability: EconomicViability,

    pub scenarios: ScenarioSet,
    pub weighted_scenario_npv: Money,
    pub sensitivity: Vec<DriverSensitivity>,

    pub monte_carlo: MonteCarloResult,
    pub risk: RiskAssessment,
    pub recommendation: InvestmentRecommendation,
    pub metadata: AnalysisMetadata,
}

/// Analyze a variety with default assumptions over `horizon_years`.
pub fn analyze(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    preferences: Option<&FarmerPreferences>,
    horizon_years: u32,
) -> AgriRoiResult<ComputationOutput<SophisticatedRoiAnalysis>> {
    let config = AnalysisConfig {
        horizon_years,
        ..AnalysisConfig::default()
    };
    analyze_with_config(variety, region, preferences, &config)
}

/// Analyze a variety under explicit assumptions.
pub fn analyze_with_config(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    preferences: Option<&FarmerPreferences>,
    config: &AnalysisConfig,
) -> AgriRoiResult<ComputationOutput<SophisticatedRoiAnalysis>> {
    let start = Instant::now();
    let _span = debug_span!(
        "analyze",
        variety = %variety.variety_name,
        crop = %variety.crop_name,
        region = %region.region_name,
    )
    .entered();

    validate_request(variety, region, config)?;
    if let Some(prefs) = preferences {
        prefs.validate()?;
    }

    let mut warnings: Vec<String> = profile_warning(variety, config).into_iter().collect();
    let (profile, _) = config.profile_for(&variety.crop_name);

    // --- Base case ---
    let model = CostRevenueModel::new(variety, region, config);
    let params = MetricsParams::from_config(config);
    let (costs, revenue) = model.build(&Multipliers::BASE);
    costs.validate()?;
    revenue.validate()?;

    let metrics = calculate_metrics(&costs, &revenue, &params);
    if metrics.irr >= config.irr_cap {
        warnings.push(format!("IRR capped at {}", fmt_pct(config.irr_cap)));
    }
    let viability = assess_viability(
        &metrics,
        region.price_volatility,
        config.horizon_years,
        config.irr_cap,
    );
    debug!(
        npv = %metrics.npv,
        irr = %metrics.irr,
        economic_score = %viability.economic_score,
        "base case evaluated"
    );

    // --- Scenarios ---
    let scenarios = evaluate_scenarios(&model, &config.scenarios, &params);
    let weighted_scenario_npv = scenarios.weighted_npv();
    let sensitivity = tornado_analysis(
        &model,
        &Multipliers::BASE,
        &params,
        config.sensitivity_swing,
    );
    debug!(weighted_npv = %weighted_scenario_npv, "scenarios evaluated");

    // --- Monte Carlo ---
    let (monte_carlo, mc_warnings) = simulate_npv(&model, &params, &config.monte_carlo)?;
    warnings.extend(mc_warnings);

    // --- Risk and recommendation ---
    let risk = assess_risk(variety, region, &config.risk_weights);
    let recommendation = synthesize(
        &RecommendationInputs {
            economic_score: viability.economic_score,
            base_npv: scenarios.base.npv,
            pessimistic_npv: scenarios.pessimistic.npv,
            weighted_npv: weighted_scenario_npv,
            irr: metrics.irr,
            profitability_index: metrics.profitability_index,
            payback_years: metrics.payback_years,
            discounted_payback_years: metrics.discounted_payback_years,
            horizon_years: config.horizon_years,
            probability_positive_npv: monte_carlo.probability_positive_npv,
            expected_shortfall: monte_carlo.expected_shortfall,
            risk: risk.clone(),
        },
        &config.recommendation_weights,
    );
    debug!(
        tier = %recommendation.tier,
        confidence = %recommendation.confidence_score,
        risk_level = %risk.risk_level,
        "recommendation synthesized"
    );

    let mut data_sources = vec![
        format!("Variety attributes: {}", variety.variety_name),
        format!("Regional context: {}", region.region_name),
        format!(
            "Cost profile: {} ({})",
            variety.crop_name.trim().to_lowercase(),
            profile.unit
        ),
    ];
    if !region.government_programs.is_empty() {
        data_sources.push(format!(
            "Government programs: {}",
            region
                .government_programs
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let metadata = AnalysisMetadata {
        discount_rate: config.discount_rate,
        reinvestment_rate: config.reinvestment_rate,
        monte_carlo_iterations: monte_carlo.iterations_completed,
        seed: monte_carlo.seed,
        data_sources,
    };

    let output = SophisticatedRoiAnalysis {
        variety_name: variety.variety_name.clone(),
        crop_name: variety.crop_name.clone(),
        region_name: region.region_name.clone(),
        horizon_years: config.horizon_years,
        npv: metrics.npv,
        irr: metrics.irr,
        root_irr: metrics.root_irr,
        mirr: metrics.mirr,
        profitability_index: metrics.profitability_index,
        payback_years: metrics.payback_years,
        discounted_payback_years: metrics.discounted_payback_years,
        break_even_yield: metrics.break_even_yield,
        break_even_price: metrics.break_even_price,
        costs,
        revenue,
        cash_flows: metrics.cash_flows,
        viability,
        scenarios,
        weighted_scenario_npv,
        sensitivity,
        monte_carlo,
        risk,
        recommendation,
        metadata,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Crop Variety ROI: DCF Metrics, Scenarios, Monte Carlo and Risk Composite",
        &serde_json::json!({
            "discount_rate": config.discount_rate.to_string(),
            "reinvestment_rate": config.reinvestment_rate.to_string(),
            "horizon_years": config.horizon_years,
            "monte_carlo_iterations": config.monte_carlo.iterations,
            "risk_weights": config.risk_weights,
            "recommendation_weights": config.recommendation_weights,
            "preferences": preferences,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::CostMultipliers;
    use crate::recommendation::synthesis::RecommendationTier;
    use rust_decimal_macros::dec;

    fn variety() -> VarietyAttributes {
        VarietyAttributes {
            variety_name: "AG36X6".into(),
            crop_name: "Soybean".into(),
            yield_potential_percentile: dec!(70),
            market_acceptance_score: dec!(3.5),
            disease_resistance_count: 4,
            yield_stability_rating: dec!(7),
            drought_tolerant: false,
            heat_tolerant: false,
            premium: None,
        }
    }

    fn region() -> RegionalContext {
        RegionalContext {
            region_name: "Southern Minnesota".into(),
            crop_name: "soybean".into(),
            base_price_per_unit: dec!(11.50),
            price_volatility: dec!(0.2),
            yield_multiplier: Decimal::ONE,
            weather_risk: dec!(0.35),
            yield_volatility_adjustment: Decimal::ZERO,
            cost_multipliers: CostMultipliers::default(),
            government_programs: vec![],
            expected_insurance_payout_per_acre: Decimal::ZERO,
        }
    }

    fn seeded_config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.monte_carlo.iterations = 2_000;
        config.monte_carlo.seed = Some(11);
        config
    }

    #[test]
    fn test_aggregate_is_internally_consistent() {
        let out = analyze_with_config(&variety(), &region(), None, &seeded_config()).unwrap();
        let a = &out.result;
        assert_eq!(a.horizon_years, 5);
        assert_eq!(a.cash_flows.len(), 5);
        assert_eq!(a.npv, a.scenarios.base.npv);
        assert_eq!(a.metadata.seed, 11);
        assert_eq!(a.metadata.monte_carlo_iterations, 2_000);
        assert_eq!(a.recommendation.confidence_score, a.recommendation.scores.total);
        assert_eq!(
            a.recommendation.tier,
            RecommendationTier::from_score(a.recommendation.confidence_score)
        );
        assert!(a.scenarios.pessimistic.npv <= a.npv && a.npv <= a.scenarios.optimistic.npv);
        assert_eq!(a.sensitivity.len(), 3);
    }

    #[test]
    fn test_horizon_zero_rejected() {
        assert!(analyze(&variety(), &region(), None, 0).is_err());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let prefs = FarmerPreferences {
            risk_tolerance: None,
            budget_per_acre: Some(dec!(-10)),
        };
        assert!(analyze_with_config(&variety(), &region(), Some(&prefs), &seeded_config()).is_err());
    }

    #[test]
    fn test_unknown_crop_warns() {
        let mut v = variety();
        v.crop_name = "quinoa".into();
        let out = analyze_with_config(&v, &region(), None, &seeded_config()).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("generic profile")));
    }
}
