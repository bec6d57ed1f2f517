use serde_json::Value;

use agri_roi_core::economics::viability;

use super::request::{self, RequestArgs};

pub fn run_economics(args: RequestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (req, config) = request::load(&args)?;
    let result = viability::analyze_economics(&req.variety, &req.region, &config)?;
    Ok(serde_json::to_value(result)?)
}
