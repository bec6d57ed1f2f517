pub mod cost_revenue;
pub mod metrics;
pub mod viability;
