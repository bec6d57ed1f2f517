use serde_json::Value;

use agri_roi_core::risk::assessment;

use super::request::{self, RequestArgs};

pub fn run_risk(args: RequestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (req, config) = request::load(&args)?;
    let result = assessment::run_risk_assessment(&req.variety, &req.region, &config)?;
    Ok(serde_json::to_value(result)?)
}
