use clap::Args;
use serde::{Deserialize, Serialize};

use agri_roi_core::config::AnalysisConfig;
use agri_roi_core::inputs::{FarmerPreferences, RegionalContext, VarietyAttributes};

use crate::input;

/// Arguments shared by every analysis subcommand
#[derive(Args)]
pub struct RequestArgs {
    /// Path to the request file (JSON or YAML); read from stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to an AnalysisConfig file (JSON or YAML) overriding the defaults
    #[arg(long)]
    pub config: Option<String>,

    /// Analysis horizon in years (overrides request and config)
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Monte Carlo trial count, 1000 to 50000
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Monte Carlo seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

/// One variety / region pair to analyze.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub variety: VarietyAttributes,
    pub region: RegionalContext,
    #[serde(default)]
    pub preferences: Option<FarmerPreferences>,
    #[serde(default)]
    pub horizon_years: Option<u32>,
}

/// Load the request and build the effective configuration.
///
/// Precedence, lowest first: built-in defaults, `--config` file, the
/// request's `horizon_years`, then command-line flags.
pub fn load(args: &RequestArgs) -> Result<(AnalysisRequest, AnalysisConfig), Box<dyn std::error::Error>> {
    let request: AnalysisRequest = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json|file.yaml> or stdin required".into());
    };

    let mut config: AnalysisConfig = match args.config {
        Some(ref path) => input::file::read_structured(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(h) = request.horizon_years {
        config.horizon_years = h;
    }
    if let Some(h) = args.horizon {
        config.horizon_years = h;
    }
    if let Some(n) = args.iterations {
        config.monte_carlo.iterations = n;
    }
    if args.seed.is_some() {
        config.monte_carlo.seed = args.seed;
    }

    tracing::debug!(
        variety = %request.variety.variety_name,
        region = %request.region.region_name,
        horizon = config.horizon_years,
        "request loaded"
    );
    Ok((request, config))
}
