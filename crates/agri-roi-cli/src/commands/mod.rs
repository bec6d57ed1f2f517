pub mod analyze;
pub mod economics;
pub mod monte_carlo;
pub mod request;
pub mod risk;
pub mod scenarios;
