use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::AnalysisConfig;
use crate::inputs::{RegionalContext, VarietyAttributes};
use crate::types::*;
use crate::AgriRoiResult;

use super::cost_revenue::{CostFactors, CostRevenueModel, Multipliers, RevenueFactors};
use super::metrics::{calculate_metrics, FinancialMetrics, MetricsParams};

const NPV_SCORE_SCALE: Decimal = dec!(2000);
const RISK_ADJUSTED_RETURN_TARGET: Decimal = dec!(0.5);

/// Component breakdown of the base-case economic viability score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicViability {
    pub npv_score: Score,
    pub irr_score: Score,
    pub payback_score: Score,
    /// Annual cash flow over investment.
    pub return_on_investment: Rate,
    /// ROI scaled down by price volatility.
    pub risk_adjusted_return: Rate,
    pub risk_adjusted_score: Score,
    pub volatility_score: Score,
    /// Weighted blend of the scores above, in [0, 1].
    pub economic_score: Score,
}

/// Blend normalised NPV, IRR, payback, risk-adjusted return and price
/// volatility into one [0, 1] score.
pub fn assess_viability(
    metrics: &FinancialMetrics,
    price_volatility: Rate,
    horizon_years: u32,
    irr_cap: Rate,
) -> EconomicViability {
    let npv_score = clamp_unit(dec!(0.5) + metrics.npv / NPV_SCORE_SCALE);
    let irr_score = if irr_cap > Decimal::ZERO {
        clamp_unit(metrics.irr / irr_cap)
    } else {
        Decimal::ZERO
    };
    let payback_score = match metrics.payback_years {
        Some(years) if horizon_years > 0 => {
            clamp_unit(Decimal::ONE - years / Decimal::from(horizon_years))
        }
        _ => Decimal::ZERO,
    };

    let return_on_investment = if metrics.initial_investment > Decimal::ZERO {
        metrics.annual_cash_flow / metrics.initial_investment
    } else {
        Decimal::ZERO
    };
    let volatility_score = clamp_unit(Decimal::ONE - price_volatility);
    let risk_adjusted_return = return_on_investment * volatility_score;
    let risk_adjusted_score = clamp_unit(risk_adjusted_return / RISK_ADJUSTED_RETURN_TARGET);

    let economic_score = clamp_unit(
        dec!(0.30) * npv_score
            + dec!(0.25) * irr_score
            + dec!(0.20) * payback_score
            + dec!(0.15) * risk_adjusted_score
            + dec!(0.10) * volatility_score,
    );

    EconomicViability {
        npv_score,
        irr_score,
        payback_score,
        return_on_investment,
        risk_adjusted_return,
        risk_adjusted_score,
        volatility_score,
        economic_score,
    }
}

/// Output of the single-scenario economic analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicAnalysis {
    pub variety_name: String,
    pub crop_name: String,
    pub horizon_years: u32,
    pub costs: CostFactors,
    pub revenue: RevenueFactors,
    pub metrics: FinancialMetrics,
    pub viability: EconomicViability,
}

pub(crate) fn validate_request(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    config: &AnalysisConfig,
) -> AgriRoiResult<()> {
    config.validate()?;
    variety.validate()?;
    region.validate()
}

pub(crate) fn profile_warning(variety: &VarietyAttributes, config: &AnalysisConfig) -> Option<String> {
    let (_, known) = config.profile_for(&variety.crop_name);
    (!known).then(|| {
        format!(
            "No cost profile for crop '{}'; generic profile used",
            variety.crop_name
        )
    })
}

/// Base-case economics only: cost/revenue breakdown, deterministic metrics
/// and the viability score, without scenarios or simulation.
pub fn analyze_economics(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    config: &AnalysisConfig,
) -> AgriRoiResult<ComputationOutput<EconomicAnalysis>> {
    let start = Instant::now();
    validate_request(variety, region, config)?;

    let mut warnings: Vec<String> = profile_warning(variety, config).into_iter().collect();

    let model = CostRevenueModel::new(variety, region, config);
    let (costs, revenue) = model.build(&Multipliers::BASE);
    costs.validate()?;
    revenue.validate()?;

    let params = MetricsParams::from_config(config);
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

    let output = EconomicAnalysis {
        variety_name: variety.variety_name.clone(),
        crop_name: variety.crop_name.clone(),
        horizon_years: config.horizon_years,
        costs,
        revenue,
        metrics,
        viability,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat Annual Cash Flow Crop Budget (NPV / IRR / MIRR / Payback)",
        &serde_json::json!({
            "discount_rate": config.discount_rate.to_string(),
            "reinvestment_rate": config.reinvestment_rate.to_string(),
            "horizon_years": config.horizon_years,
            "region": region.region_name,
            "irr_method": "simple return proxy, capped",
        }),
        warnings,
        elapsed,
        output,
    ))
}
