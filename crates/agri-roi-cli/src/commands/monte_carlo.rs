use serde_json::Value;

use agri_roi_core::monte_carlo::simulation;

use super::request::{self, RequestArgs};

pub fn run_monte_carlo(args: RequestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (req, config) = request::load(&args)?;
    let result = simulation::run_variety_simulation(&req.variety, &req.region, &config)?;
    Ok(serde_json::to_value(result)?)
}
