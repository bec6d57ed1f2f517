use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::AnalysisConfig;
use crate::economics::cost_revenue::{CostRevenueModel, Multipliers};
use crate::economics::metrics::{calculate_metrics, MetricsParams};
use crate::economics::viability::{profile_warning, validate_request};
use crate::inputs::{RegionalContext, VarietyAttributes};
use crate::types::*;
use crate::AgriRoiResult;

/// Weights used to blend the three scenario NPVs into one figure.
pub const OPTIMISTIC_WEIGHT: Decimal = dec!(0.3);
pub const BASE_WEIGHT: Decimal = dec!(0.5);
pub const PESSIMISTIC_WEIGHT: Decimal = dec!(0.2);

const Z_95: Decimal = dec!(1.96);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Optimistic,
    Base,
    Pessimistic,
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioKind::Optimistic => write!(f, "optimistic"),
            ScenarioKind::Base => write!(f, "base"),
            ScenarioKind::Pessimistic => write!(f, "pessimistic"),
        }
    }
}

/// Multiplier set for each named scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub optimistic: Multipliers,
    pub base: Multipliers,
    pub pessimistic: Multipliers,
}

impl Default for ScenarioTable {
    fn default() -> Self {
        Self {
            optimistic: Multipliers {
                yield_factor: dec!(1.15),
                price: dec!(1.10),
                cost: dec!(0.95),
                weather_risk: dec!(0.70),
                market_volatility: dec!(0.80),
            },
            base: Multipliers::BASE,
            pessimistic: Multipliers {
                yield_factor: dec!(0.85),
                price: dec!(0.90),
                cost: dec!(1.10),
                weather_risk: dec!(1.30),
                market_volatility: dec!(1.20),
            },
        }
    }
}

impl ScenarioTable {
    pub fn multipliers(&self, kind: ScenarioKind) -> &Multipliers {
        match kind {
            ScenarioKind::Optimistic => &self.optimistic,
            ScenarioKind::Base => &self.base,
            ScenarioKind::Pessimistic => &self.pessimistic,
        }
    }

    pub fn validate(&self) -> AgriRoiResult<()> {
        self.optimistic.validate("scenarios.optimistic")?;
        self.base.validate("scenarios.base")?;
        self.pessimistic.validate("scenarios.pessimistic")
    }
}

/// Result for a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub kind: ScenarioKind,
    pub multipliers: Multipliers,
    pub npv: Money,
    pub irr: Rate,
    pub payback_years: Option<Years>,
    pub expected_profit_per_acre: Money,
    pub probability_of_profit: Score,
    pub confidence_interval_95: ConfidenceInterval<Money>,
    pub total_cost_per_acre: Money,
    pub total_revenue_per_acre: Money,
}

/// Exactly one result per scenario kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub optimistic: ScenarioResult,
    pub base: ScenarioResult,
    pub pessimistic: ScenarioResult,
}

impl ScenarioSet {
    pub fn get(&self, kind: ScenarioKind) -> &ScenarioResult {
        match kind {
            ScenarioKind::Optimistic => &self.optimistic,
            ScenarioKind::Base => &self.base,
            ScenarioKind::Pessimistic => &self.pessimistic,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioResult> {
        [&self.optimistic, &self.base, &self.pessimistic].into_iter()
    }

    /// 0.3 * optimistic + 0.5 * base + 0.2 * pessimistic NPV.
    pub fn weighted_npv(&self) -> Money {
        OPTIMISTIC_WEIGHT * self.optimistic.npv
            + BASE_WEIGHT * self.base.npv
            + PESSIMISTIC_WEIGHT * self.pessimistic.npv
    }
}

/// Quick, scenario-specific estimate of the chance the season is profitable.
/// Independent of the Monte Carlo distribution.
pub fn probability_of_profit(kind: ScenarioKind, profit: Money) -> Score {
    match kind {
        ScenarioKind::Optimistic => clamp(dec!(0.8) + profit / dec!(1000), dec!(0.7), dec!(0.95)),
        ScenarioKind::Base => clamp(dec!(0.5) + profit / dec!(2000), dec!(0.1), dec!(0.9)),
        ScenarioKind::Pessimistic => {
            clamp(dec!(0.2) + profit / dec!(1000), dec!(0.05), dec!(0.3))
        }
    }
}

/// profit ± 1.96σ with σ a fixed fraction of |profit| per scenario.
pub fn profit_confidence_interval(kind: ScenarioKind, profit: Money) -> ConfidenceInterval<Money> {
    let sigma_fraction = match kind {
        ScenarioKind::Optimistic => dec!(0.15),
        ScenarioKind::Base => dec!(0.20),
        ScenarioKind::Pessimistic => dec!(0.25),
    };
    let half_width = Z_95 * profit.abs() * sigma_fraction;
    ConfidenceInterval {
        lower: profit - half_width,
        upper: profit + half_width,
    }
}

fn evaluate(model: &CostRevenueModel<'_>, kind: ScenarioKind, m: &Multipliers, params: &MetricsParams) -> ScenarioResult {
    let (costs, revenue) = model.build(m);
    let metrics = calculate_metrics(&costs, &revenue, params);
    let profit = metrics.annual_cash_flow;

    ScenarioResult {
        kind,
        multipliers: *m,
        npv: metrics.npv,
        irr: metrics.irr,
        payback_years: metrics.payback_years,
        expected_profit_per_acre: profit,
        probability_of_profit: probability_of_profit(kind, profit),
        confidence_interval_95: profit_confidence_interval(kind, profit),
        total_cost_per_acre: metrics.total_cost_per_acre,
        total_revenue_per_acre: metrics.total_revenue_per_acre,
    }
}

/// Rebuild cost/revenue under each scenario's multipliers and compute its
/// metrics.
pub fn evaluate_scenarios(
    model: &CostRevenueModel<'_>,
    table: &ScenarioTable,
    params: &MetricsParams,
) -> ScenarioSet {
    ScenarioSet {
        optimistic: evaluate(model, ScenarioKind::Optimistic, &table.optimistic, params),
        base: evaluate(model, ScenarioKind::Base, &table.base, params),
        pessimistic: evaluate(model, ScenarioKind::Pessimistic, &table.pessimistic, params),
    }
}

/// Output of the standalone scenario analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub scenarios: ScenarioSet,
    pub weighted_npv: Money,
    /// Optimistic NPV minus pessimistic NPV.
    pub npv_spread: Money,
}

/// Run the optimistic / base / pessimistic analysis for one variety.
pub fn run_scenario_analysis(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    config: &AnalysisConfig,
) -> AgriRoiResult<ComputationOutput<ScenarioAnalysis>> {
    let start = Instant::now();
    validate_request(variety, region, config)?;
    let mut warnings: Vec<String> = profile_warning(variety, config).into_iter().collect();

    let model = CostRevenueModel::new(variety, region, config);
    let params = MetricsParams::from_config(config);
    let scenarios = evaluate_scenarios(&model, &config.scenarios, &params);

    if scenarios.pessimistic.npv > scenarios.base.npv || scenarios.base.npv > scenarios.optimistic.npv {
        warnings.push("Scenario NPVs are not ordered pessimistic <= base <= optimistic; check the scenario table".into());
    }

    let output = ScenarioAnalysis {
        weighted_npv: scenarios.weighted_npv(),
        npv_spread: scenarios.optimistic.npv - scenarios.pessimistic.npv,
        scenarios,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Optimistic/Base/Pessimistic Scenario Analysis",
        &serde_json::json!({
            "scenario_weights": {
                "optimistic": OPTIMISTIC_WEIGHT.to_string(),
                "base": BASE_WEIGHT.to_string(),
                "pessimistic": PESSIMISTIC_WEIGHT.to_string(),
            },
            "scenario_table": config.scenarios,
            "discount_rate": config.discount_rate.to_string(),
            "horizon_years": config.horizon_years,
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

    fn variety() -> VarietyAttributes {
        VarietyAttributes {
            variety_name: "AG36X6".into(),
            crop_name: "soybean".into(),
            yield_potential_percentile: dec!(75),
            market_acceptance_score: dec!(4.2),
            disease_resistance_count: 6,
            yield_stability_rating: dec!(7),
            drought_tolerant: true,
            heat_tolerant: false,
            premium: None,
        }
    }

    fn region() -> RegionalContext {
        RegionalContext {
            region_name: "Southern Minnesota".into(),
            crop_name: "soybean".into(),
            base_price_per_unit: dec!(11.80),
            price_volatility: dec!(0.18),
            yield_multiplier: dec!(1.05),
            weather_risk: dec!(0.35),
            yield_volatility_adjustment: Decimal::ZERO,
            cost_multipliers: CostMultipliers::default(),
            government_programs: vec![],
            expected_insurance_payout_per_acre: Decimal::ZERO,
        }
    }

    #[test]
    fn test_three_scenarios_are_ordered() {
        let result = run_scenario_analysis(&variety(), &region(), &AnalysisConfig::default()).unwrap();
        let s = &result.result.scenarios;
        assert_eq!(s.optimistic.kind, ScenarioKind::Optimistic);
        assert_eq!(s.base.kind, ScenarioKind::Base);
        assert_eq!(s.pessimistic.kind, ScenarioKind::Pessimistic);
        assert!(s.pessimistic.npv <= s.base.npv);
        assert!(s.base.npv <= s.optimistic.npv);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_multipliers_applied_to_inputs_not_totals() {
        let config = AnalysisConfig::default();
        let result = run_scenario_analysis(&variety(), &region(), &config).unwrap();
        let s = &result.result.scenarios;
        // Cost lines scale linearly, so totals follow the cost multiplier exactly.
        assert_eq!(
            s.pessimistic.total_cost_per_acre,
            s.base.total_cost_per_acre * dec!(1.10)
        );
        // Revenue does not: weather and volatility multipliers also move
        // the yield loss and price discount.
        let naive = s.base.total_revenue_per_acre * dec!(0.85) * dec!(0.90);
        assert!(s.pessimistic.total_revenue_per_acre < naive);
    }

    #[test]
    fn test_probability_of_profit_bounds() {
        assert_eq!(probability_of_profit(ScenarioKind::Optimistic, dec!(500)), dec!(0.95));
        assert_eq!(probability_of_profit(ScenarioKind::Optimistic, dec!(-500)), dec!(0.7));
        assert_eq!(probability_of_profit(ScenarioKind::Base, dec!(200)), dec!(0.6));
        assert_eq!(probability_of_profit(ScenarioKind::Base, dec!(-2000)), dec!(0.1));
        assert_eq!(probability_of_profit(ScenarioKind::Pessimistic, dec!(50)), dec!(0.25));
        assert_eq!(probability_of_profit(ScenarioKind::Pessimistic, dec!(-400)), dec!(0.05));
    }

    #[test]
    fn test_confidence_interval_width() {
        let ci = profit_confidence_interval(ScenarioKind::Base, dec!(100));
        // sigma = 20, half width = 39.2
        assert_eq!(ci.lower, dec!(60.8));
        assert_eq!(ci.upper, dec!(139.2));

        let ci = profit_confidence_interval(ScenarioKind::Pessimistic, dec!(-100));
        // sigma uses |profit|
        assert_eq!(ci.lower, dec!(-149));
        assert_eq!(ci.upper, dec!(-51));
    }

    #[test]
    fn test_weighted_npv() {
        let result = run_scenario_analysis(&variety(), &region(), &AnalysisConfig::default()).unwrap();
        let s = &result.result.scenarios;
        let expected = dec!(0.3) * s.optimistic.npv + dec!(0.5) * s.base.npv + dec!(0.2) * s.pessimistic.npv;
        assert_eq!(result.result.weighted_npv, expected);
        assert_eq!(s.iter().count(), 3);
    }
}
