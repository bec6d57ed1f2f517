use serde_json::Value;

use agri_roi_core::analysis;

use super::request::{self, RequestArgs};

pub fn run_analyze(args: RequestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (req, config) = request::load(&args)?;
    let result = analysis::analyze_with_config(
        &req.variety,
        &req.region,
        req.preferences.as_ref(),
        &config,
    )?;
    Ok(serde_json::to_value(result)?)
}
