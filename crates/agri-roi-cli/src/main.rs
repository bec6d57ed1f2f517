mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::request::RequestArgs;

/// Crop variety return-on-investment analysis
#[derive(Parser)]
#[command(
    name = "agri-roi",
    version,
    about = "Crop variety return-on-investment analysis",
    long_about = "Evaluates the economics of adopting a crop variety in a region: \
                  NPV, IRR, MIRR and payback on a per-acre crop budget, optimistic / \
                  base / pessimistic scenarios, Monte Carlo NPV simulation, a weather / \
                  market / yield risk composite and a buy/sell recommendation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log pipeline stages to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: metrics, scenarios, Monte Carlo, risk and recommendation
    Analyze(RequestArgs),
    /// Base-case crop budget, deterministic metrics and economic score
    Economics(RequestArgs),
    /// Optimistic / base / pessimistic scenario comparison
    Scenarios(RequestArgs),
    /// Monte Carlo NPV simulation
    MonteCarlo(RequestArgs),
    /// Weather, market and yield risk composite
    Risk(RequestArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// `--verbose` forces debug; otherwise `AGRI_ROI_LOG` applies, defaulting to warn.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("AGRI_ROI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Economics(args) => commands::economics::run_economics(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args),
        Commands::Risk(args) => commands::risk::run_risk(args),
        Commands::Version => {
            println!("agri-roi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
