use serde_json::Value;

use agri_roi_core::scenarios::scenario;

use super::request::{self, RequestArgs};

pub fn run_scenarios(args: RequestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (req, config) = request::load(&args)?;
    let result = scenario::run_scenario_analysis(&req.variety, &req.region, &config)?;
    Ok(serde_json::to_value(result)?)
}
