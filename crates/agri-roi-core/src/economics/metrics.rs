//! Deterministic per-acre investment metrics.
//!
//! The crop budget is modelled as a flat annual cash flow (total revenue
//! minus total cost per acre) over the analysis horizon, with the first
//! season's total cost treated as the initial investment. No terminal value.
//!
//! Degenerate economics never raise: a non-positive cash flow yields an IRR
//! of 0 and `None` (never recovered) for both payback measures.
//!
//! The headline `irr` is a simple-return proxy (cash flow / investment,
//! capped), not a root-finding IRR. A Newton-Raphson IRR on the same cash
//! flows is reported separately as `root_irr`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::time_value::{annuity_factor, discount_factor, future_value_annuity_factor, irr};
use crate::types::{Money, Rate, Years};

use super::cost_revenue::{CostFactors, RevenueFactors};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Rates and caps the calculator needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsParams {
    pub discount_rate: Rate,
    pub reinvestment_rate: Rate,
    pub horizon_years: u32,
    pub irr_cap: Rate,
    pub mirr_cap: Rate,
}

impl MetricsParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            discount_rate: config.discount_rate,
            reinvestment_rate: config.reinvestment_rate,
            horizon_years: config.horizon_years,
            irr_cap: config.irr_cap,
            mirr_cap: config.mirr_cap,
        }
    }
}

impl Default for MetricsParams {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// One year of the projected cash-flow sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCashFlow {
    pub year: u32,
    pub cash_flow: Money,
    pub discounted_cash_flow: Money,
    /// Running position net of the initial investment.
    pub cumulative_cash_flow: Money,
    pub cumulative_discounted_cash_flow: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_cost_per_acre: Money,
    pub total_revenue_per_acre: Money,
    pub annual_cash_flow: Money,
    pub initial_investment: Money,
    pub npv: Money,
    /// Simple-return IRR proxy, capped.
    pub irr: Rate,
    /// Newton-Raphson IRR; `None` when cash flow is non-positive or the
    /// solver does not converge.
    pub root_irr: Option<Rate>,
    pub mirr: Rate,
    pub profitability_index: Decimal,
    /// `None` = never pays back.
    pub payback_years: Option<Years>,
    /// `None` = not recovered within the horizon.
    pub discounted_payback_years: Option<Years>,
    /// `None` when market price is zero.
    pub break_even_yield: Option<Decimal>,
    /// `None` when expected yield is zero.
    pub break_even_price: Option<Money>,
    pub cash_flows: Vec<YearCashFlow>,
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// NPV of a flat annual cash flow received at the end of years 1..=horizon.
///
/// The single NPV routine shared by the deterministic, scenario and Monte
/// Carlo paths. Saturates rather than overflowing.
pub fn npv_of_flat_cash_flow(annual_cash_flow: Money, rate: Rate, horizon_years: u32) -> Money {
    annual_cash_flow.saturating_mul(annuity_factor(rate, horizon_years))
}

pub fn irr_proxy(annual_cash_flow: Money, initial_investment: Money, cap: Rate) -> Rate {
    if annual_cash_flow <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if initial_investment <= Decimal::ZERO {
        return cap;
    }
    (annual_cash_flow / initial_investment).min(cap)
}

pub fn root_finding_irr(
    annual_cash_flow: Money,
    initial_investment: Money,
    horizon_years: u32,
) -> Option<Rate> {
    if annual_cash_flow <= Decimal::ZERO || initial_investment <= Decimal::ZERO {
        return None;
    }
    let mut flows = Vec::with_capacity(horizon_years as usize + 1);
    flows.push(-initial_investment);
    flows.extend(std::iter::repeat(annual_cash_flow).take(horizon_years as usize));
    irr(&flows, dec!(0.10)).ok()
}

pub fn mirr(
    annual_cash_flow: Money,
    initial_investment: Money,
    reinvestment_rate: Rate,
    horizon_years: u32,
    cap: Rate,
) -> Rate {
    if annual_cash_flow <= Decimal::ZERO
        || initial_investment <= Decimal::ZERO
        || horizon_years == 0
    {
        return Decimal::ZERO;
    }
    let terminal = annual_cash_flow
        .saturating_mul(future_value_annuity_factor(reinvestment_rate, horizon_years));
    let exponent = Decimal::ONE / Decimal::from(horizon_years);
    match terminal
        .checked_div(initial_investment)
        .and_then(|ratio| ratio.checked_powd(exponent))
    {
        Some(growth) => (growth - Decimal::ONE).min(cap),
        None => cap,
    }
}

pub fn profitability_index(npv: Money, initial_investment: Money) -> Decimal {
    if initial_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    npv.saturating_add(initial_investment)
        .checked_div(initial_investment)
        .unwrap_or(Decimal::MAX)
        .max(Decimal::ZERO)
}

pub fn payback_period(annual_cash_flow: Money, initial_investment: Money) -> Option<Years> {
    if annual_cash_flow <= Decimal::ZERO {
        return None;
    }
    initial_investment.max(Decimal::ZERO).checked_div(annual_cash_flow)
}

/// First year at which cumulative discounted cash flow covers the
/// investment, interpolated linearly within that year.
pub fn discounted_payback_period(
    annual_cash_flow: Money,
    initial_investment: Money,
    rate: Rate,
    horizon_years: u32,
) -> Option<Years> {
    if initial_investment <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    if annual_cash_flow <= Decimal::ZERO {
        return None;
    }
    let mut cumulative = Decimal::ZERO;
    for year in 1..=horizon_years {
        let discounted = annual_cash_flow.saturating_mul(discount_factor(rate, year));
        if cumulative.saturating_add(discounted) >= initial_investment {
            let fraction = (initial_investment - cumulative).checked_div(discounted)?;
            return Some(Decimal::from(year - 1) + fraction);
        }
        cumulative = cumulative.saturating_add(discounted);
    }
    None
}

/// Yield at which commodity sales alone cover total cost. Premium, subsidy
/// and insurance revenue are not netted off, so with any of those present
/// the yield that zeroes profit is lower than this.
pub fn break_even_yield(total_cost: Money, market_price: Money) -> Option<Decimal> {
    if market_price <= Decimal::ZERO {
        return None;
    }
    Some(total_cost / market_price)
}

/// Commodity price at which sales alone cover total cost, on the same basis
/// as [`break_even_yield`].
pub fn break_even_price(total_cost: Money, expected_yield: Decimal) -> Option<Money> {
    if expected_yield <= Decimal::ZERO {
        return None;
    }
    Some(total_cost / expected_yield)
}

fn cash_flow_schedule(
    annual_cash_flow: Money,
    initial_investment: Money,
    rate: Rate,
    horizon_years: u32,
) -> Vec<YearCashFlow> {
    let mut cumulative = -initial_investment;
    let mut cumulative_discounted = -initial_investment;
    (1..=horizon_years)
        .map(|year| {
            let discounted = annual_cash_flow.saturating_mul(discount_factor(rate, year));
            cumulative = cumulative.saturating_add(annual_cash_flow);
            cumulative_discounted = cumulative_discounted.saturating_add(discounted);
            YearCashFlow {
                year,
                cash_flow: annual_cash_flow,
                discounted_cash_flow: discounted,
                cumulative_cash_flow: cumulative,
                cumulative_discounted_cash_flow: cumulative_discounted,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the full deterministic metric set for one cost/revenue pair.
pub fn calculate_metrics(
    costs: &CostFactors,
    revenue: &RevenueFactors,
    params: &MetricsParams,
) -> FinancialMetrics {
    let total_cost = costs.total();
    let total_revenue = revenue.total();
    let cf = total_revenue - total_cost;
    let investment = total_cost;
    let horizon = params.horizon_years;

    let npv = npv_of_flat_cash_flow(cf, params.discount_rate, horizon);

    FinancialMetrics {
        total_cost_per_acre: total_cost,
        total_revenue_per_acre: total_revenue,
        annual_cash_flow: cf,
        initial_investment: investment,
        npv,
        irr: irr_proxy(cf, investment, params.irr_cap),
        root_irr: root_finding_irr(cf, investment, horizon),
        mirr: mirr(
            cf,
            investment,
            params.reinvestment_rate,
            horizon,
            params.mirr_cap,
        ),
        profitability_index: profitability_index(npv, investment),
        payback_years: payback_period(cf, investment),
        discounted_payback_years: discounted_payback_period(
            cf,
            investment,
            params.discount_rate,
            horizon,
        ),
        break_even_yield: break_even_yield(total_cost, revenue.market_price_per_unit),
        break_even_price: break_even_price(total_cost, revenue.expected_yield_per_acre),
        cash_flows: cash_flow_schedule(cf, investment, params.discount_rate, horizon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs(total_other: Money) -> CostFactors {
        CostFactors {
            seed_unit_cost: dec!(3.50),
            seeding_rate: dec!(32),
            fertilizer: dec!(150),
            pesticide: dec!(60),
            fuel: dec!(35),
            labor: dec!(30),
            equipment: dec!(80),
            insurance: dec!(25),
            other: total_other,
        }
    }

    fn revenue(yield_per_acre: Decimal, price: Money) -> RevenueFactors {
        RevenueFactors {
            expected_yield_per_acre: yield_per_acre,
            market_price_per_unit: price,
            premium_price_per_unit: None,
            premium_share: None,
            government_subsidies: Decimal::ZERO,
            insurance_payout: Decimal::ZERO,
        }
    }

    #[test]
    fn test_npv_flat_cash_flow() {
        // 200 * annuity(8%, 5) = 200 * 3.99271 = 798.54
        let npv = npv_of_flat_cash_flow(dec!(200), dec!(0.08), 5);
        assert!((npv - dec!(798.54)).abs() < dec!(0.01), "npv={npv}");
    }

    #[test]
    fn test_full_metrics_profitable() {
        // cost 532, revenue 200 * 3.66 = 732, cf = 200
        let m = calculate_metrics(
            &costs(dec!(40)),
            &revenue(dec!(200), dec!(3.66)),
            &MetricsParams::default(),
        );
        assert_eq!(m.total_cost_per_acre, dec!(532));
        assert_eq!(m.annual_cash_flow, dec!(200));
        assert!((m.npv - dec!(798.54)).abs() < dec!(0.01));
        // 200 / 532 = 0.3759
        assert!((m.irr - dec!(0.3759)).abs() < dec!(0.0001));
        // 532 / 200
        assert_eq!(m.payback_years, Some(dec!(2.66)));
        assert!(m.discounted_payback_years.unwrap() > dec!(2.66));
        assert!(m.discounted_payback_years.unwrap() < dec!(4));
        // PI = (798.54 + 532) / 532 ≈ 2.501
        assert!((m.profitability_index - dec!(2.501)).abs() < dec!(0.001));
        assert_eq!(m.cash_flows.len(), 5);
        assert_eq!(m.cash_flows[4].cumulative_cash_flow, dec!(468));
    }

    #[test]
    fn test_root_irr_is_below_proxy_for_short_horizon() {
        let m = calculate_metrics(
            &costs(dec!(40)),
            &revenue(dec!(200), dec!(3.66)),
            &MetricsParams::default(),
        );
        let root = m.root_irr.expect("root IRR should converge");
        // -532 followed by five 200s solves to ~25.6%
        assert!((root - dec!(0.256)).abs() < dec!(0.005), "root={root}");
        // NPV at the root IRR is ~0
        let at_root = npv_of_flat_cash_flow(dec!(200), root, 5) - dec!(532);
        assert!(at_root.abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_capped_at_fifty_percent() {
        assert_eq!(irr_proxy(dec!(900), dec!(500), dec!(0.50)), dec!(0.50));
        assert_eq!(irr_proxy(dec!(100), Decimal::ZERO, dec!(0.50)), dec!(0.50));
    }

    #[test]
    fn test_mirr_matches_closed_form() {
        // FV = 200 * 5.86660 = 1173.32; (1173.32 / 532)^(1/5) - 1 ≈ 0.1716
        let r = mirr(dec!(200), dec!(532), dec!(0.08), 5, dec!(0.50));
        assert!((r - dec!(0.1716)).abs() < dec!(0.001), "mirr={r}");
    }

    #[test]
    fn test_degenerate_cash_flow_sentinels() {
        let m = calculate_metrics(
            &costs(dec!(1000)),
            &revenue(dec!(100), dec!(4)),
            &MetricsParams::default(),
        );
        assert!(m.annual_cash_flow < Decimal::ZERO);
        assert_eq!(m.irr, Decimal::ZERO);
        assert_eq!(m.mirr, Decimal::ZERO);
        assert_eq!(m.root_irr, None);
        assert_eq!(m.payback_years, None);
        assert_eq!(m.discounted_payback_years, None);
        assert_eq!(m.profitability_index, Decimal::ZERO);
    }

    #[test]
    fn test_discounted_payback_not_reached_in_horizon() {
        // 100/yr against 1000 never recovers in 5 years
        assert_eq!(
            discounted_payback_period(dec!(100), dec!(1000), dec!(0.08), 5),
            None
        );
    }

    #[test]
    fn test_discounted_payback_interpolates() {
        // Zero rate: 300/yr against 750 pays back at 2.5 years
        assert_eq!(
            discounted_payback_period(dec!(300), dec!(750), Decimal::ZERO, 5),
            Some(dec!(2.5))
        );
    }

    #[test]
    fn test_break_even_round_trip() {
        let c = costs(dec!(40));
        let price = dec!(4.25);
        let be_yield = break_even_yield(c.total(), price).unwrap();
        let rev = revenue(be_yield, price);
        assert!((rev.total() - c.total()).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_break_even_ignores_support_revenue() {
        let c = costs(dec!(40));
        let price = dec!(4.25);
        let be_yield = break_even_yield(c.total(), price).unwrap();
        let mut rev = revenue(be_yield, price);
        rev.government_subsidies = dec!(18);
        rev.insurance_payout = dec!(7);
        // Commodity sales break even; support payments sit on top
        assert!((rev.base_revenue() - c.total()).abs() < dec!(0.0000001));
        assert!((rev.total() - c.total() - dec!(25)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_saturating_metrics_on_extreme_rates() {
        let params = MetricsParams {
            discount_rate: dec!(50),
            reinvestment_rate: dec!(50),
            horizon_years: 20,
            irr_cap: dec!(0.50),
            mirr_cap: dec!(0.50),
        };
        let m = calculate_metrics(&costs(dec!(40)), &revenue(dec!(200), dec!(3.66)), &params);
        // 200 * (1/51 + 1/51^2 + ...) ≈ 200 / 50
        assert!((m.npv - dec!(4)).abs() < dec!(0.01), "npv={}", m.npv);
        assert_eq!(m.mirr, dec!(0.50));
        assert_eq!(m.discounted_payback_years, None);
        assert_eq!(m.cash_flows.len(), 20);
        assert_eq!(m.cash_flows[19].discounted_cash_flow, Decimal::ZERO);
    }

    #[test]
    fn test_break_even_zero_denominators() {
        assert_eq!(break_even_yield(dec!(500), Decimal::ZERO), None);
        assert_eq!(break_even_price(dec!(500), Decimal::ZERO), None);
    }
}
