use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, CropCostProfile};
use crate::error::AgriRoiError;
use crate::inputs::{check_multiplier, RegionalContext, VarietyAttributes};
use crate::types::{clamp_unit, Money, Rate};
use crate::AgriRoiResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Multipliers applied to the underlying inputs of the cost/revenue model.
///
/// Scenarios use fixed sets of these; Monte Carlo trials sample them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub yield_factor: Decimal,
    pub price: Decimal,
    pub cost: Decimal,
    pub weather_risk: Decimal,
    pub market_volatility: Decimal,
}

impl Multipliers {
    pub const BASE: Multipliers = Multipliers {
        yield_factor: Decimal::ONE,
        price: Decimal::ONE,
        cost: Decimal::ONE,
        weather_risk: Decimal::ONE,
        market_volatility: Decimal::ONE,
    };

    pub(crate) fn validate(&self, field: &str) -> AgriRoiResult<()> {
        for (name, value) in [
            ("yield_factor", self.yield_factor),
            ("price", self.price),
            ("cost", self.cost),
            ("weather_risk", self.weather_risk),
            ("market_volatility", self.market_volatility),
        ] {
            check_multiplier(format!("{field}.{name}"), value)?;
        }
        Ok(())
    }
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::BASE
    }
}

/// Per-acre cost line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostFactors {
    pub seed_unit_cost: Money,
    pub seeding_rate: Decimal,
    pub fertilizer: Money,
    pub pesticide: Money,
    pub fuel: Money,
    pub labor: Money,
    pub equipment: Money,
    pub insurance: Money,
    pub other: Money,
}

impl CostFactors {
    pub fn seed_cost(&self) -> Money {
        self.seed_unit_cost * self.seeding_rate
    }

    pub fn total(&self) -> Money {
        self.seed_cost()
            + self.fertilizer
            + self.pesticide
            + self.fuel
            + self.labor
            + self.equipment
            + self.insurance
            + self.other
    }

    pub fn validate(&self) -> AgriRoiResult<()> {
        for (name, value) in [
            ("seed_unit_cost", self.seed_unit_cost),
            ("seeding_rate", self.seeding_rate),
            ("fertilizer", self.fertilizer),
            ("pesticide", self.pesticide),
            ("fuel", self.fuel),
            ("labor", self.labor),
            ("equipment", self.equipment),
            ("insurance", self.insurance),
            ("other", self.other),
        ] {
            if value < Decimal::ZERO {
                return Err(AgriRoiError::invalid(
                    format!("costs.{name}"),
                    "Cost components must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// Per-acre revenue components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueFactors {
    pub expected_yield_per_acre: Decimal,
    pub market_price_per_unit: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_price_per_unit: Option<Money>,
    /// Share of the yield sold at the premium.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_share: Option<Rate>,
    pub government_subsidies: Money,
    pub insurance_payout: Money,
}

impl RevenueFactors {
    pub fn base_revenue(&self) -> Money {
        self.expected_yield_per_acre * self.market_price_per_unit
    }

    pub fn premium_revenue(&self) -> Money {
        match (self.premium_price_per_unit, self.premium_share) {
            (Some(premium), Some(share)) => self.expected_yield_per_acre * share * premium,
            _ => Decimal::ZERO,
        }
    }

    pub fn total(&self) -> Money {
        self.base_revenue()
            + self.premium_revenue()
            + self.government_subsidies
            + self.insurance_payout
    }

    pub fn validate(&self) -> AgriRoiResult<()> {
        for (name, value) in [
            ("expected_yield_per_acre", self.expected_yield_per_acre),
            ("market_price_per_unit", self.market_price_per_unit),
            ("government_subsidies", self.government_subsidies),
            ("insurance_payout", self.insurance_payout),
        ] {
            if value < Decimal::ZERO {
                return Err(AgriRoiError::invalid(
                    format!("revenue.{name}"),
                    "Revenue components must be non-negative",
                ));
            }
        }
        if self.premium_price_per_unit.is_some_and(|p| p < Decimal::ZERO) {
            return Err(AgriRoiError::invalid(
                "revenue.premium_price_per_unit",
                "Premium cannot be negative",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Yield factor from the variety's yield-potential percentile:
/// 0.8 at the 0th percentile rising linearly to 1.2 at the 100th.
pub fn variety_yield_factor(variety: &VarietyAttributes) -> Decimal {
    dec!(0.8) + dec!(0.4) * variety.yield_potential_percentile / dec!(100)
}

pub fn build_cost_factors(
    profile: &CropCostProfile,
    region: &RegionalContext,
    m: &Multipliers,
) -> CostFactors {
    let cm = &region.cost_multipliers;
    CostFactors {
        seed_unit_cost: profile.seed_unit_cost * cm.seed * m.cost,
        seeding_rate: profile.seeding_rate,
        fertilizer: profile.fertilizer * cm.fertilizer * m.cost,
        pesticide: profile.pesticide * cm.pesticide * m.cost,
        fuel: profile.fuel * cm.fuel * m.cost,
        labor: profile.labor * cm.labor * m.cost,
        equipment: profile.equipment * cm.equipment * m.cost,
        insurance: profile.insurance * cm.insurance * m.cost,
        other: profile.other * cm.other * m.cost,
    }
}

pub fn build_revenue_factors(
    profile: &CropCostProfile,
    variety: &VarietyAttributes,
    region: &RegionalContext,
    m: &Multipliers,
    weather_loss_factor: Rate,
    volatility_price_discount: Rate,
) -> RevenueFactors {
    let weather = clamp_unit(region.weather_risk * m.weather_risk);
    let volatility = clamp_unit(region.price_volatility * m.market_volatility);

    let expected_yield = profile.base_yield_per_acre
        * region.yield_multiplier
        * variety_yield_factor(variety)
        * m.yield_factor
        * (Decimal::ONE - weather_loss_factor * weather);
    let market_price =
        region.base_price_per_unit * m.price * (Decimal::ONE - volatility_price_discount * volatility);

    let (premium_price_per_unit, premium_share) = match &variety.premium {
        Some(p) => (Some(p.premium_per_unit * m.price), Some(p.share_of_yield)),
        None => (None, None),
    };

    RevenueFactors {
        expected_yield_per_acre: expected_yield,
        market_price_per_unit: market_price,
        premium_price_per_unit,
        premium_share,
        government_subsidies: region.total_program_payments(),
        insurance_payout: region.expected_insurance_payout_per_acre,
    }
}

/// Binds a variety, its region and the crop profile so cost/revenue pairs
/// can be rebuilt cheaply for any multiplier set.
#[derive(Debug, Clone)]
pub struct CostRevenueModel<'a> {
    pub variety: &'a VarietyAttributes,
    pub region: &'a RegionalContext,
    pub profile: &'a CropCostProfile,
    pub weather_loss_factor: Rate,
    pub volatility_price_discount: Rate,
}

impl<'a> CostRevenueModel<'a> {
    pub fn new(
        variety: &'a VarietyAttributes,
        region: &'a RegionalContext,
        config: &'a AnalysisConfig,
    ) -> Self {
        let (profile, _) = config.profile_for(&variety.crop_name);
        Self {
            variety,
            region,
            profile,
            weather_loss_factor: config.weather_loss_factor,
            volatility_price_discount: config.volatility_price_discount,
        }
    }

    pub fn build(&self, m: &Multipliers) -> (CostFactors, RevenueFactors) {
        let costs = build_cost_factors(self.profile, self.region, m);
        let revenue = build_revenue_factors(
            self.profile,
            self.variety,
            self.region,
            m,
            self.weather_loss_factor,
            self.volatility_price_discount,
        );
        (costs, revenue)
    }

    /// Annual per-acre cash flow (revenue minus cost) under `m`.
    pub fn annual_cash_flow(&self, m: &Multipliers) -> Money {
        let (costs, revenue) = self.build(m);
        revenue.total() - costs.total()
    }
}
