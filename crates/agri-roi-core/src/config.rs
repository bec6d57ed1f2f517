//! Per-request analysis configuration.
//!
//! Every table and constant the engine consults lives here so callers can
//! override any of them for a single request. `AnalysisConfig::default()`
//! reproduces the standard assumptions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AgriRoiError;
use crate::inputs::check_amount;
use crate::monte_carlo::simulation::MonteCarloConfig;
use crate::recommendation::synthesis::RecommendationWeights;
use crate::risk::assessment::RiskWeights;
use crate::scenarios::scenario::ScenarioTable;
use crate::types::{Money, Rate};
use crate::AgriRoiResult;

/// Baseline per-acre production economics for a crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropCostProfile {
    /// Yield unit, e.g. "bu".
    pub unit: String,
    /// Expected yield per acre before regional and variety adjustments.
    pub base_yield_per_acre: Decimal,
    /// Cost per seed unit (per thousand seeds, per lb, ...).
    pub seed_unit_cost: Money,
    /// Seed units per acre.
    pub seeding_rate: Decimal,
    pub fertilizer: Money,
    pub pesticide: Money,
    pub fuel: Money,
    pub labor: Money,
    pub equipment: Money,
    pub insurance: Money,
    pub other: Money,
}

impl CropCostProfile {
    pub fn corn() -> Self {
        Self {
            unit: "bu".into(),
            base_yield_per_acre: dec!(180),
            seed_unit_cost: dec!(3.50),
            seeding_rate: dec!(32),
            fertilizer: dec!(150),
            pesticide: dec!(60),
            fuel: dec!(35),
            labor: dec!(30),
            equipment: dec!(80),
            insurance: dec!(25),
            other: dec!(40),
        }
    }

    pub fn soybean() -> Self {
        Self {
            unit: "bu".into(),
            base_yield_per_acre: dec!(55),
            seed_unit_cost: dec!(0.45),
            seeding_rate: dec!(140),
            fertilizer: dec!(45),
            pesticide: dec!(40),
            fuel: dec!(25),
            labor: dec!(25),
            equipment: dec!(65),
            insurance: dec!(18),
            other: dec!(30),
        }
    }

    pub fn wheat() -> Self {
        Self {
            unit: "bu".into(),
            base_yield_per_acre: dec!(70),
            seed_unit_cost: dec!(0.30),
            seeding_rate: dec!(100),
            fertilizer: dec!(90),
            pesticide: dec!(35),
            fuel: dec!(25),
            labor: dec!(22),
            equipment: dec!(60),
            insurance: dec!(15),
            other: dec!(28),
        }
    }

    /// Used when a crop has no profile of its own.
    pub fn generic() -> Self {
        Self {
            unit: "unit".into(),
            base_yield_per_acre: dec!(100),
            seed_unit_cost: dec!(1.00),
            seeding_rate: dec!(50),
            fertilizer: dec!(80),
            pesticide: dec!(40),
            fuel: dec!(25),
            labor: dec!(25),
            equipment: dec!(50),
            insurance: dec!(15),
            other: dec!(25),
        }
    }

    fn validate(&self, crop: &str) -> AgriRoiResult<()> {
        let lines = [
            ("base_yield_per_acre", self.base_yield_per_acre),
            ("seed_unit_cost", self.seed_unit_cost),
            ("seeding_rate", self.seeding_rate),
            ("fertilizer", self.fertilizer),
            ("pesticide", self.pesticide),
            ("fuel", self.fuel),
            ("labor", self.labor),
            ("equipment", self.equipment),
            ("insurance", self.insurance),
            ("other", self.other),
        ];
        for (name, value) in lines {
            check_amount(format!("crop_profiles.{crop}.{name}"), value)?;
        }
        Ok(())
    }
}

fn default_crop_profiles() -> BTreeMap<String, CropCostProfile> {
    let mut profiles = BTreeMap::new();
    profiles.insert("corn".to_string(), CropCostProfile::corn());
    profiles.insert("soybean".to_string(), CropCostProfile::soybean());
    profiles.insert("wheat".to_string(), CropCostProfile::wheat());
    profiles
}

/// Longest analysis horizon accepted.
pub const MAX_HORIZON_YEARS: u32 = 100;
/// Highest discount or reinvestment rate accepted (1000%).
pub const MAX_RATE: Rate = dec!(10);

fn default_discount_rate() -> Rate {
    dec!(0.08)
}

fn default_reinvestment_rate() -> Rate {
    dec!(0.08)
}

fn default_horizon_years() -> u32 {
    5
}

fn default_return_cap() -> Rate {
    dec!(0.50)
}

fn default_weather_loss_factor() -> Rate {
    dec!(0.15)
}

fn default_volatility_price_discount() -> Rate {
    dec!(0.10)
}

fn default_sensitivity_swing() -> Rate {
    dec!(0.10)
}

/// All tunable assumptions for one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Rate,
    /// Rate at which positive cash flows are reinvested for MIRR.
    #[serde(default = "default_reinvestment_rate")]
    pub reinvestment_rate: Rate,
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,
    #[serde(default = "default_return_cap")]
    pub irr_cap: Rate,
    #[serde(default = "default_return_cap")]
    pub mirr_cap: Rate,
    /// Share of yield lost at a weather risk score of 1.0.
    #[serde(default = "default_weather_loss_factor")]
    pub weather_loss_factor: Rate,
    /// Realised price discount at a market volatility score of 1.0.
    #[serde(default = "default_volatility_price_discount")]
    pub volatility_price_discount: Rate,
    /// Relative swing applied to each driver in the tornado analysis.
    #[serde(default = "default_sensitivity_swing")]
    pub sensitivity_swing: Rate,
    #[serde(default)]
    pub scenarios: ScenarioTable,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default = "default_crop_profiles")]
    pub crop_profiles: BTreeMap<String, CropCostProfile>,
    #[serde(default = "CropCostProfile::generic")]
    pub fallback_profile: CropCostProfile,
    #[serde(default)]
    pub risk_weights: RiskWeights,
    #[serde(default)]
    pub recommendation_weights: RecommendationWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            discount_rate: default_discount_rate(),
            reinvestment_rate: default_reinvestment_rate(),
            horizon_years: default_horizon_years(),
            irr_cap: default_return_cap(),
            mirr_cap: default_return_cap(),
            weather_loss_factor: default_weather_loss_factor(),
            volatility_price_discount: default_volatility_price_discount(),
            sensitivity_swing: default_sensitivity_swing(),
            scenarios: ScenarioTable::default(),
            monte_carlo: MonteCarloConfig::default(),
            crop_profiles: default_crop_profiles(),
            fallback_profile: CropCostProfile::generic(),
            risk_weights: RiskWeights::default(),
            recommendation_weights: RecommendationWeights::default(),
        }
    }
}

impl AnalysisConfig {
    /// Look up the cost profile for a crop (case-insensitive). Returns the
    /// fallback profile and `false` when the crop is not in the table.
    pub fn profile_for(&self, crop_name: &str) -> (&CropCostProfile, bool) {
        let key = crop_name.trim().to_lowercase();
        match self.crop_profiles.get(&key) {
            Some(profile) => (profile, true),
            None => (&self.fallback_profile, false),
        }
    }

    pub fn validate(&self) -> AgriRoiResult<()> {
        if self.horizon_years == 0 || self.horizon_years > MAX_HORIZON_YEARS {
            return Err(AgriRoiError::invalid(
                "horizon_years",
                format!("Analysis horizon must be between 1 and {MAX_HORIZON_YEARS} years"),
            ));
        }
        for (name, rate) in [
            ("discount_rate", self.discount_rate),
            ("reinvestment_rate", self.reinvestment_rate),
        ] {
            if rate <= dec!(-1) || rate > MAX_RATE {
                return Err(AgriRoiError::invalid(
                    name,
                    "Rate must be greater than -100% and at most 1000%",
                ));
            }
        }
        if self.irr_cap <= Decimal::ZERO || self.mirr_cap <= Decimal::ZERO {
            return Err(AgriRoiError::invalid(
                "irr_cap",
                "Return caps must be positive",
            ));
        }
        for (name, value) in [
            ("weather_loss_factor", self.weather_loss_factor),
            ("volatility_price_discount", self.volatility_price_discount),
            ("sensitivity_swing", self.sensitivity_swing),
        ] {
            if value < Decimal::ZERO || value >= Decimal::ONE {
                return Err(AgriRoiError::invalid(name, "Must be in [0, 1)"));
            }
        }
        for (crop, profile) in &self.crop_profiles {
            profile.validate(crop)?;
        }
        self.fallback_profile.validate("fallback")?;
        self.scenarios.validate()?;
        self.monte_carlo.validate()?;
        self.risk_weights.validate()?;
        self.recommendation_weights.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_profile_lookup_case_insensitive() {
        let config = AnalysisConfig::default();
        let (profile, known) = config.profile_for(" Corn ");
        assert!(known);
        assert_eq!(profile.base_yield_per_acre, dec!(180));
    }

    #[test]
    fn test_unknown_crop_uses_fallback() {
        let config = AnalysisConfig::default();
        let (profile, known) = config.profile_for("quinoa");
        assert!(!known);
        assert_eq!(profile.unit, "unit");
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let config = AnalysisConfig {
            horizon_years: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_horizon_and_rate_ceilings() {
        let long = AnalysisConfig {
            horizon_years: 1000,
            ..AnalysisConfig::default()
        };
        assert!(long.validate().is_err());

        let steep = AnalysisConfig {
            discount_rate: dec!(50),
            horizon_years: 20,
            ..AnalysisConfig::default()
        };
        match steep.validate().unwrap_err() {
            AgriRoiError::InvalidInput { field, .. } => assert_eq!(field, "discount_rate"),
            other => panic!("unexpected error: {other}"),
        }

        let edge = AnalysisConfig {
            discount_rate: MAX_RATE,
            reinvestment_rate: MAX_RATE,
            horizon_years: MAX_HORIZON_YEARS,
            ..AnalysisConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let config: AnalysisConfig = serde_json::from_value(serde_json::json!({
            "discount_rate": "0.06",
            "monte_carlo": { "iterations": 2000, "seed": 7 }
        }))
        .unwrap();
        assert_eq!(config.discount_rate, dec!(0.06));
        assert_eq!(config.horizon_years, 5);
        assert_eq!(config.monte_carlo.iterations, 2000);
        assert_eq!(config.monte_carlo.seed, Some(7));
        assert_eq!(config.crop_profiles.len(), 3);
        assert!(config.validate().is_ok());
    }
}
