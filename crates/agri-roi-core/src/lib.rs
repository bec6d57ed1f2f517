//! Return-on-investment analysis for adopting a crop variety in a region.
//!
//! [`analysis::analyze`] is the usual entry point. Each stage is also
//! exposed on its own: [`economics::viability::analyze_economics`],
//! [`scenarios::scenario::run_scenario_analysis`],
//! [`monte_carlo::simulation::run_variety_simulation`] and
//! [`risk::assessment::run_risk_assessment`].

pub mod analysis;
pub mod config;
pub mod economics;
pub mod error;
pub mod inputs;
pub mod monte_carlo;
pub mod recommendation;
pub mod risk;
pub mod scenarios;
pub mod time_value;
pub mod types;

pub use error::AgriRoiError;
pub use types::*;

/// Standard result type for all agri-roi operations
pub type AgriRoiResult<T> = Result<T, AgriRoiError>;
