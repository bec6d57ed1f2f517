use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::economics::cost_revenue::{CostRevenueModel, Multipliers};
use crate::economics::metrics::{npv_of_flat_cash_flow, MetricsParams};
use crate::types::{Money, Rate};

/// Input driver swung in the tornado analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityDriver {
    Yield,
    Price,
    Cost,
}

impl SensitivityDriver {
    pub const ALL: [SensitivityDriver; 3] = [
        SensitivityDriver::Yield,
        SensitivityDriver::Price,
        SensitivityDriver::Cost,
    ];

    fn apply(&self, base: &Multipliers, factor: Decimal) -> Multipliers {
        let mut m = *base;
        match self {
            SensitivityDriver::Yield => m.yield_factor *= factor,
            SensitivityDriver::Price => m.price *= factor,
            SensitivityDriver::Cost => m.cost *= factor,
        }
        m
    }
}

/// NPV response to one driver moved down and up by the swing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSensitivity {
    pub driver: SensitivityDriver,
    pub swing: Rate,
    pub npv_at_low: Money,
    pub npv_at_high: Money,
    /// |npv_at_high - npv_at_low|
    pub npv_range: Money,
}

/// Swing yield, price and cost by ±`swing` around the base multipliers and
/// record the NPV at each end. Sorted widest range first.
pub fn tornado_analysis(
    model: &CostRevenueModel<'_>,
    base: &Multipliers,
    params: &MetricsParams,
    swing: Rate,
) -> Vec<DriverSensitivity> {
    let npv_at = |m: &Multipliers| {
        npv_of_flat_cash_flow(
            model.annual_cash_flow(m),
            params.discount_rate,
            params.horizon_years,
        )
    };

    let mut drivers: Vec<DriverSensitivity> = SensitivityDriver::ALL
        .iter()
        .map(|driver| {
            let low = npv_at(&driver.apply(base, Decimal::ONE - swing));
            let high = npv_at(&driver.apply(base, Decimal::ONE + swing));
            DriverSensitivity {
                driver: *driver,
                swing,
                npv_at_low: low,
                npv_at_high: high,
                npv_range: (high - low).abs(),
            }
        })
        .collect();

    drivers.sort_by(|a, b| b.npv_range.cmp(&a.npv_range));
    drivers
}
