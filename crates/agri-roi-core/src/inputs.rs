//! Plain input records handed to the engine by the surrounding service.
//!
//! Market prices, regional context and program tables are resolved before
//! an analysis starts; nothing in here performs I/O.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AgriRoiError;
use crate::types::{Money, Rate};
use crate::AgriRoiResult;

/// Ceiling on any multiplier input, matching the Monte Carlo draw cap.
pub const MAX_MULTIPLIER: Decimal = dec!(1000);
/// Ceiling on any per-acre or per-unit money input.
pub const MAX_AMOUNT: Money = dec!(1000000000);

/// Shared range check for money inputs.
pub(crate) fn check_amount(field: impl Into<String>, value: Money) -> AgriRoiResult<()> {
    if value < Decimal::ZERO {
        return Err(AgriRoiError::invalid(field, "Cannot be negative"));
    }
    if value > MAX_AMOUNT {
        return Err(AgriRoiError::invalid(
            field,
            format!("Cannot exceed {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

/// Shared range check for multiplier inputs.
pub(crate) fn check_multiplier(field: impl Into<String>, value: Decimal) -> AgriRoiResult<()> {
    if value < Decimal::ZERO || value > MAX_MULTIPLIER {
        return Err(AgriRoiError::invalid(
            field,
            format!("Must be between 0 and {MAX_MULTIPLIER}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Variety
// ---------------------------------------------------------------------------

/// Premium market access for a variety (identity-preserved, specialty
/// contracts and similar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumPricing {
    /// Price uplift per unit over the commodity price.
    pub premium_per_unit: Money,
    /// Fraction of the harvest that qualifies for the premium.
    pub share_of_yield: Rate,
}

/// Agronomic and market attributes of the crop variety under evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarietyAttributes {
    pub variety_name: String,
    pub crop_name: String,
    /// Yield potential relative to other varieties of the crop, 0-100.
    pub yield_potential_percentile: Decimal,
    /// Buyer acceptance score, 0-5.
    pub market_acceptance_score: Decimal,
    /// Number of diseases the variety is rated resistant to.
    pub disease_resistance_count: u32,
    /// Yield stability across environments, nominally 1-10.
    pub yield_stability_rating: Decimal,
    #[serde(default)]
    pub drought_tolerant: bool,
    #[serde(default)]
    pub heat_tolerant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<PremiumPricing>,
}

impl VarietyAttributes {
    pub fn validate(&self) -> AgriRoiResult<()> {
        if self.yield_potential_percentile < Decimal::ZERO
            || self.yield_potential_percentile > dec!(100)
        {
            return Err(AgriRoiError::invalid(
                "variety.yield_potential_percentile",
                "Must be between 0 and 100",
            ));
        }
        if self.market_acceptance_score < Decimal::ZERO || self.market_acceptance_score > dec!(5)
        {
            return Err(AgriRoiError::invalid(
                "variety.market_acceptance_score",
                "Must be between 0 and 5",
            ));
        }
        if self.yield_stability_rating < Decimal::ZERO || self.yield_stability_rating > dec!(10) {
            return Err(AgriRoiError::invalid(
                "variety.yield_stability_rating",
                "Must be between 0 and 10",
            ));
        }
        if let Some(premium) = &self.premium {
            check_amount("variety.premium.premium_per_unit", premium.premium_per_unit)?;
            if premium.share_of_yield < Decimal::ZERO || premium.share_of_yield > Decimal::ONE {
                return Err(AgriRoiError::invalid(
                    "variety.premium.share_of_yield",
                    "Must be between 0 and 1",
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Regional multipliers on each cost line item of the crop profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostMultipliers {
    #[serde(default = "one")]
    pub seed: Decimal,
    #[serde(default = "one")]
    pub fertilizer: Decimal,
    #[serde(default = "one")]
    pub pesticide: Decimal,
    #[serde(default = "one")]
    pub fuel: Decimal,
    #[serde(default = "one")]
    pub labor: Decimal,
    #[serde(default = "one")]
    pub equipment: Decimal,
    #[serde(default = "one")]
    pub insurance: Decimal,
    #[serde(default = "one")]
    pub other: Decimal,
}

fn one() -> Decimal {
    Decimal::ONE
}

impl Default for CostMultipliers {
    fn default() -> Self {
        Self::uniform(Decimal::ONE)
    }
}

impl CostMultipliers {
    /// Same multiplier on every line item.
    pub fn uniform(value: Decimal) -> Self {
        Self {
            seed: value,
            fertilizer: value,
            pesticide: value,
            fuel: value,
            labor: value,
            equipment: value,
            insurance: value,
            other: value,
        }
    }

    fn entries(&self) -> [(&'static str, Decimal); 8] {
        [
            ("seed", self.seed),
            ("fertilizer", self.fertilizer),
            ("pesticide", self.pesticide),
            ("fuel", self.fuel),
            ("labor", self.labor),
            ("equipment", self.equipment),
            ("insurance", self.insurance),
            ("other", self.other),
        ]
    }
}

/// A per-acre government program payment available in the region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernmentProgram {
    pub name: String,
    pub per_acre_payment: Money,
}

/// Regional market, weather and cost context for the crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalContext {
    #[serde(default)]
    pub region_name: String,
    pub crop_name: String,
    pub base_price_per_unit: Money,
    /// Annualised price volatility, 0-1.
    pub price_volatility: Rate,
    /// Regional yield relative to the crop profile's base yield.
    #[serde(default = "one")]
    pub yield_multiplier: Decimal,
    /// Baseline weather risk score, 0-1.
    pub weather_risk: Rate,
    /// Additive adjustment to yield volatility risk.
    #[serde(default)]
    pub yield_volatility_adjustment: Decimal,
    #[serde(default)]
    pub cost_multipliers: CostMultipliers,
    #[serde(default)]
    pub government_programs: Vec<GovernmentProgram>,
    #[serde(default)]
    pub expected_insurance_payout_per_acre: Money,
}

impl RegionalContext {
    pub fn validate(&self) -> AgriRoiResult<()> {
        check_amount("region.base_price_per_unit", self.base_price_per_unit)?;
        if self.price_volatility < Decimal::ZERO || self.price_volatility > Decimal::ONE {
            return Err(AgriRoiError::invalid(
                "region.price_volatility",
                "Must be between 0 and 1",
            ));
        }
        if self.weather_risk < Decimal::ZERO || self.weather_risk > Decimal::ONE {
            return Err(AgriRoiError::invalid(
                "region.weather_risk",
                "Must be between 0 and 1",
            ));
        }
        check_multiplier("region.yield_multiplier", self.yield_multiplier)?;
        for (name, value) in self.cost_multipliers.entries() {
            check_multiplier(format!("region.cost_multipliers.{name}"), value)?;
        }
        for program in &self.government_programs {
            check_amount(
                format!("region.government_programs[{}]", program.name),
                program.per_acre_payment,
            )?;
        }
        check_amount(
            "region.expected_insurance_payout_per_acre",
            self.expected_insurance_payout_per_acre,
        )?;
        Ok(())
    }

    /// Total per-acre government program payments.
    pub fn total_program_payments(&self) -> Money {
        self.government_programs
            .iter()
            .map(|p| p.per_acre_payment)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Farmer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

/// Accepted for forward compatibility; no calculation reads it yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmerPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_per_acre: Option<Money>,
}

impl FarmerPreferences {
    pub fn validate(&self) -> AgriRoiResult<()> {
        match self.budget_per_acre {
            Some(budget) => check_amount("preferences.budget_per_acre", budget),
            None => Ok(()),
        }
    }
}
