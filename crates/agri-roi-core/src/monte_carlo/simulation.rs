use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{LogNormal, Normal, Triangular, Uniform};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, debug_span, warn};

use crate::config::AnalysisConfig;
use crate::economics::cost_revenue::{CostRevenueModel, Multipliers};
use crate::economics::metrics::{npv_of_flat_cash_flow, MetricsParams};
use crate::economics::viability::{profile_warning, validate_request};
use crate::error::AgriRoiError;
use crate::inputs::{RegionalContext, VarietyAttributes};
use crate::types::{ComputationMetadata, ComputationOutput, ConfidenceInterval};
use crate::AgriRoiResult;

pub const MIN_ITERATIONS: u32 = 1_000;
pub const MAX_ITERATIONS: u32 = 50_000;

/// Trials per RNG stream. Fixed so results do not depend on thread count.
const TRIALS_PER_CHUNK: u32 = 500;
const HISTOGRAM_BINS: usize = 20;
/// Draws outside [0, MAX_MULTIPLIER] fail the trial.
const MAX_MULTIPLIER: f64 = 1_000.0;
const LOGGED_FAILURES: usize = 10;

// ---------------------------------------------------------------------------
// Helper: build ComputationOutput without requiring Decimal
// ---------------------------------------------------------------------------

fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Probability distribution specification for a Monte Carlo variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McDistribution {
    Normal { mean: f64, std_dev: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
}

/// A sampled multiplier: its distribution plus optional hard bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledMultiplier {
    pub distribution: McDistribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
}

impl SampledMultiplier {
    pub fn normal(mean: f64, std_dev: f64, floor: f64) -> Self {
        Self {
            distribution: McDistribution::Normal { mean, std_dev },
            floor: Some(floor),
            cap: None,
        }
    }

    pub fn uniform(min: f64, max: f64) -> Self {
        Self {
            distribution: McDistribution::Uniform { min, max },
            floor: None,
            cap: None,
        }
    }
}

fn default_iterations() -> u32 {
    10_000
}

fn default_min_success_fraction() -> f64 {
    0.5
}

fn default_yield_sampler() -> SampledMultiplier {
    SampledMultiplier::normal(1.0, 0.15, 0.5)
}

fn default_price_sampler() -> SampledMultiplier {
    SampledMultiplier::normal(1.0, 0.10, 0.7)
}

fn default_cost_sampler() -> SampledMultiplier {
    SampledMultiplier::normal(1.0, 0.08, 0.8)
}

fn default_weather_sampler() -> SampledMultiplier {
    SampledMultiplier::uniform(0.7, 1.3)
}

fn default_market_sampler() -> SampledMultiplier {
    SampledMultiplier::uniform(0.8, 1.2)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of trials, 1,000 to 50,000.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Seed for reproducibility. A random seed is drawn (and reported) when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Minimum fraction of trials that must succeed.
    #[serde(default = "default_min_success_fraction")]
    pub min_success_fraction: f64,
    #[serde(default = "default_yield_sampler")]
    pub yield_factor: SampledMultiplier,
    #[serde(default = "default_price_sampler")]
    pub price: SampledMultiplier,
    #[serde(default = "default_cost_sampler")]
    pub cost: SampledMultiplier,
    #[serde(default = "default_weather_sampler")]
    pub weather_risk: SampledMultiplier,
    #[serde(default = "default_market_sampler")]
    pub market_volatility: SampledMultiplier,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: None,
            min_success_fraction: default_min_success_fraction(),
            yield_factor: default_yield_sampler(),
            price: default_price_sampler(),
            cost: default_cost_sampler(),
            weather_risk: default_weather_sampler(),
            market_volatility: default_market_sampler(),
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> AgriRoiResult<()> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(AgriRoiError::InvalidInput {
                field: "monte_carlo.iterations".into(),
                reason: format!(
                    "Must be between {MIN_ITERATIONS} and {MAX_ITERATIONS} (got {})",
                    self.iterations
                ),
            });
        }
        if !(self.min_success_fraction > 0.0 && self.min_success_fraction <= 1.0) {
            return Err(AgriRoiError::InvalidInput {
                field: "monte_carlo.min_success_fraction".into(),
                reason: "Must be in (0, 1]".into(),
            });
        }
        TrialSamplers::new(self).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Percentile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McPercentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// A single histogram bin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

/// Distribution statistics of a simulated NPV sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvStatistics {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    /// Fraction of samples with NPV > 0.
    pub probability_positive: f64,
    /// 5th percentile of the sample.
    pub value_at_risk_95: f64,
    /// Mean of all samples at or below `value_at_risk_95`.
    pub expected_shortfall: f64,
    /// Confidence level (90, 95, 99) to symmetric percentile interval.
    pub confidence_intervals: BTreeMap<u32, ConfidenceInterval<f64>>,
    pub percentiles: McPercentiles,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub iterations_requested: u32,
    pub iterations_completed: u32,
    pub failed_trials: u32,
    pub seed: u64,
    pub mean_npv: f64,
    pub median_npv: f64,
    pub std_dev_npv: f64,
    pub min_npv: f64,
    pub max_npv: f64,
    pub skewness: f64,
    pub probability_positive_npv: f64,
    pub value_at_risk_95: f64,
    pub expected_shortfall: f64,
    pub confidence_intervals: BTreeMap<u32, ConfidenceInterval<f64>>,
    pub percentiles: McPercentiles,
    pub histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Distribution constructed and validated once, before any trial runs.
#[derive(Debug, Clone)]
enum Sampler {
    Normal(Normal),
    LogNormal(LogNormal),
    Triangular(Triangular),
    Uniform(Uniform),
}

impl Sampler {
    fn new(dist: &McDistribution, field: &str) -> AgriRoiResult<Self> {
        let invalid = |e: String| AgriRoiError::InvalidInput {
            field: format!("monte_carlo.{field}"),
            reason: e,
        };
        match dist {
            McDistribution::Normal { mean, std_dev } => Normal::new(*mean, *std_dev)
                .map(Sampler::Normal)
                .map_err(|e| invalid(format!("Invalid Normal parameters: {e}"))),
            McDistribution::LogNormal { mu, sigma } => LogNormal::new(*mu, *sigma)
                .map(Sampler::LogNormal)
                .map_err(|e| invalid(format!("Invalid LogNormal parameters: {e}"))),
            McDistribution::Triangular { min, mode, max } => Triangular::new(*min, *max, *mode)
                .map(Sampler::Triangular)
                .map_err(|e| invalid(format!("Invalid Triangular parameters: {e}"))),
            McDistribution::Uniform { min, max } => Uniform::new(*min, *max)
                .map(Sampler::Uniform)
                .map_err(|e| invalid(format!("Invalid Uniform parameters: {e}"))),
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Sampler::Normal(d) => rng.sample(d),
            Sampler::LogNormal(d) => rng.sample(d),
            Sampler::Triangular(d) => rng.sample(d),
            Sampler::Uniform(d) => rng.sample(d),
        }
    }
}

#[derive(Debug, Clone)]
struct BoundedSampler {
    name: &'static str,
    sampler: Sampler,
    floor: Option<f64>,
    cap: Option<f64>,
}

impl BoundedSampler {
    fn new(name: &'static str, multiplier: &SampledMultiplier) -> AgriRoiResult<Self> {
        if let (Some(floor), Some(cap)) = (multiplier.floor, multiplier.cap) {
            if floor > cap {
                return Err(AgriRoiError::InvalidInput {
                    field: format!("monte_carlo.{name}"),
                    reason: "floor must not exceed cap".into(),
                });
            }
        }
        Ok(Self {
            name,
            sampler: Sampler::new(&multiplier.distribution, name)?,
            floor: multiplier.floor,
            cap: multiplier.cap,
        })
    }

    fn draw(&self, rng: &mut StdRng) -> Result<Decimal, String> {
        let raw = self.sampler.sample(rng);
        if !raw.is_finite() {
            return Err(format!("{} draw is not finite", self.name));
        }
        let mut value = raw;
        if let Some(floor) = self.floor {
            value = value.max(floor);
        }
        if let Some(cap) = self.cap {
            value = value.min(cap);
        }
        if !(0.0..=MAX_MULTIPLIER).contains(&value) {
            return Err(format!("{} multiplier {value} out of range", self.name));
        }
        Decimal::from_f64_retain(value)
            .ok_or_else(|| format!("{} multiplier {value} not representable", self.name))
    }
}

#[derive(Debug, Clone)]
struct TrialSamplers {
    yield_factor: BoundedSampler,
    price: BoundedSampler,
    cost: BoundedSampler,
    weather_risk: BoundedSampler,
    market_volatility: BoundedSampler,
}

impl TrialSamplers {
    fn new(config: &MonteCarloConfig) -> AgriRoiResult<Self> {
        Ok(Self {
            yield_factor: BoundedSampler::new("yield_factor", &config.yield_factor)?,
            price: BoundedSampler::new("price", &config.price)?,
            cost: BoundedSampler::new("cost", &config.cost)?,
            weather_risk: BoundedSampler::new("weather_risk", &config.weather_risk)?,
            market_volatility: BoundedSampler::new("market_volatility", &config.market_volatility)?,
        })
    }

    /// Draw order is fixed: yield, price, cost, weather, market.
    fn draw(&self, rng: &mut StdRng) -> Result<Multipliers, String> {
        Ok(Multipliers {
            yield_factor: self.yield_factor.draw(rng)?,
            price: self.price.draw(rng)?,
            cost: self.cost.draw(rng)?,
            weather_risk: self.weather_risk.draw(rng)?,
            market_volatility: self.market_volatility.draw(rng)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Trials
// ---------------------------------------------------------------------------

struct TrialContext<'a> {
    model: &'a CostRevenueModel<'a>,
    params: &'a MetricsParams,
    samplers: &'a TrialSamplers,
    seed: u64,
    iterations: u32,
}

#[derive(Default)]
struct ChunkOutcome {
    npvs: Vec<f64>,
    failures: Vec<(u32, String)>,
}

fn chunk_seed(seed: u64, chunk: u32) -> u64 {
    seed ^ (u64::from(chunk) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn run_trial(ctx: &TrialContext<'_>, rng: &mut StdRng) -> Result<f64, String> {
    let m = ctx.samplers.draw(rng)?;
    let cash_flow = ctx.model.annual_cash_flow(&m);
    let npv = npv_of_flat_cash_flow(cash_flow, ctx.params.discount_rate, ctx.params.horizon_years);
    npv.to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("NPV {npv} not representable as f64"))
}

fn simulate_chunk(ctx: &TrialContext<'_>, chunk: u32) -> ChunkOutcome {
    let first = chunk * TRIALS_PER_CHUNK;
    let last = (first + TRIALS_PER_CHUNK).min(ctx.iterations);
    let mut rng = StdRng::seed_from_u64(chunk_seed(ctx.seed, chunk));
    let mut outcome = ChunkOutcome {
        npvs: Vec::with_capacity((last - first) as usize),
        failures: Vec::new(),
    };
    for trial in first..last {
        match run_trial(ctx, &mut rng) {
            Ok(npv) => outcome.npvs.push(npv),
            Err(reason) => outcome.failures.push((trial, reason)),
        }
    }
    outcome
}

fn run_chunks(ctx: &TrialContext<'_>) -> Vec<ChunkOutcome> {
    let n_chunks = ctx.iterations.div_ceil(TRIALS_PER_CHUNK);

    #[cfg(feature = "parallel")]
    let chunks: Vec<ChunkOutcome> = (0..n_chunks)
        .into_par_iter()
        .map(|c| simulate_chunk(ctx, c))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let chunks: Vec<ChunkOutcome> = (0..n_chunks).map(|c| simulate_chunk(ctx, c)).collect();

    chunks
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Compute the percentile value from a **sorted** slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Build a histogram with `num_bins` equal-width bins.
fn build_histogram(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    let min_val = sorted[0];
    let max_val = sorted[sorted.len() - 1];

    // Handle case where all values are the same
    if (max_val - min_val).abs() < f64::EPSILON {
        return vec![HistogramBin {
            lower: min_val,
            upper: max_val,
            count: sorted.len() as u32,
            frequency: 1.0,
        }];
    }

    let bin_width = (max_val - min_val) / num_bins as f64;
    let n = sorted.len() as f64;

    let mut bins: Vec<HistogramBin> = (0..num_bins)
        .map(|i| {
            let lower = min_val + i as f64 * bin_width;
            let upper = if i == num_bins - 1 {
                max_val
            } else {
                min_val + (i + 1) as f64 * bin_width
            };
            HistogramBin {
                lower,
                upper,
                count: 0,
                frequency: 0.0,
            }
        })
        .collect();

    for &val in sorted {
        let idx = (((val - min_val) / bin_width).floor() as usize).min(num_bins - 1);
        bins[idx].count += 1;
    }

    for bin in &mut bins {
        bin.frequency = bin.count as f64 / n;
    }

    bins
}

/// Summarise an NPV sample. The slice is sorted in place.
///
/// Returns `None` for an empty sample.
pub fn compute_statistics(values: &mut [f64]) -> Option<NpvStatistics> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;

    let median = if values.len() % 2 == 0 {
        let mid = values.len() / 2;
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[values.len() / 2]
    };

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    // Skewness (population)
    let skewness = if std_dev > f64::EPSILON {
        values
            .iter()
            .map(|v| ((v - mean) / std_dev).powi(3))
            .sum::<f64>()
            / n
    } else {
        0.0
    };

    let probability_positive = values.iter().filter(|&&v| v > 0.0).count() as f64 / n;

    let value_at_risk_95 = percentile_sorted(values, 5.0);
    let tail: Vec<f64> = values
        .iter()
        .copied()
        .take_while(|&v| v <= value_at_risk_95)
        .collect();
    let expected_shortfall = if tail.is_empty() {
        value_at_risk_95
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    };

    let mut confidence_intervals = BTreeMap::new();
    for (level, lo, hi) in [(90, 5.0, 95.0), (95, 2.5, 97.5), (99, 0.5, 99.5)] {
        confidence_intervals.insert(
            level,
            ConfidenceInterval {
                lower: percentile_sorted(values, lo),
                upper: percentile_sorted(values, hi),
            },
        );
    }

    let percentiles = McPercentiles {
        p5: value_at_risk_95,
        p10: percentile_sorted(values, 10.0),
        p25: percentile_sorted(values, 25.0),
        p50: percentile_sorted(values, 50.0),
        p75: percentile_sorted(values, 75.0),
        p90: percentile_sorted(values, 90.0),
        p95: percentile_sorted(values, 95.0),
    };

    Some(NpvStatistics {
        mean,
        median,
        std_dev,
        min: values[0],
        max: values[values.len() - 1],
        skewness,
        probability_positive,
        value_at_risk_95,
        expected_shortfall,
        confidence_intervals,
        percentiles,
        histogram: build_histogram(values, HISTOGRAM_BINS),
    })
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Run the NPV simulation for an already-validated model.
///
/// Returns the result plus warnings about skipped trials. Fails with
/// `SimulationFailure` when fewer than `min_success_fraction` of the trials
/// complete.
pub fn simulate_npv(
    model: &CostRevenueModel<'_>,
    params: &MetricsParams,
    config: &MonteCarloConfig,
) -> AgriRoiResult<(MonteCarloResult, Vec<String>)> {
    config.validate()?;
    let samplers = TrialSamplers::new(config)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let iterations = config.iterations;

    let _span = debug_span!("monte_carlo", iterations, seed).entered();

    let ctx = TrialContext {
        model,
        params,
        samplers: &samplers,
        seed,
        iterations,
    };

    let mut npvs: Vec<f64> = Vec::with_capacity(iterations as usize);
    let mut failures: Vec<(u32, String)> = Vec::new();
    for chunk in run_chunks(&ctx) {
        npvs.extend(chunk.npvs);
        failures.extend(chunk.failures);
    }

    for (trial, reason) in failures.iter().take(LOGGED_FAILURES) {
        warn!(trial, reason = %reason, "Monte Carlo trial skipped");
    }

    let completed = npvs.len() as u32;
    let failed = failures.len() as u32;
    let required = (config.min_success_fraction * f64::from(iterations)).ceil() as u32;
    if completed == 0 || completed < required {
        return Err(AgriRoiError::SimulationFailure {
            completed,
            requested: iterations,
            reason: failures
                .first()
                .map(|(_, r)| r.clone())
                .unwrap_or_else(|| "no trials completed".into()),
        });
    }

    let mut warnings = Vec::new();
    if failed > 0 {
        warnings.push(format!(
            "{failed} of {iterations} Monte Carlo trials skipped ({})",
            failures[0].1
        ));
    }

    let stats = compute_statistics(&mut npvs).ok_or_else(|| {
        AgriRoiError::InsufficientData("Monte Carlo produced no NPV samples".into())
    })?;
    debug!(
        completed,
        failed,
        mean = stats.mean,
        var_95 = stats.value_at_risk_95,
        "Monte Carlo finished"
    );

    let result = MonteCarloResult {
        iterations_requested: iterations,
        iterations_completed: completed,
        failed_trials: failed,
        seed,
        mean_npv: stats.mean,
        median_npv: stats.median,
        std_dev_npv: stats.std_dev,
        min_npv: stats.min,
        max_npv: stats.max,
        skewness: stats.skewness,
        probability_positive_npv: stats.probability_positive,
        value_at_risk_95: stats.value_at_risk_95,
        expected_shortfall: stats.expected_shortfall,
        confidence_intervals: stats.confidence_intervals,
        percentiles: stats.percentiles,
        histogram: stats.histogram,
    };
    Ok((result, warnings))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the Monte Carlo NPV simulation for one variety.
///
/// Each trial samples yield, price, cost, weather-risk and
/// market-volatility multipliers, rebuilds the per-acre cost/revenue pair
/// and discounts the resulting flat cash flow over the horizon.
pub fn run_variety_simulation(
    variety: &VarietyAttributes,
    region: &RegionalContext,
    config: &AnalysisConfig,
) -> AgriRoiResult<ComputationOutput<MonteCarloResult>> {
    let start = Instant::now();
    validate_request(variety, region, config)?;

    let model = CostRevenueModel::new(variety, region, config);
    let params = MetricsParams::from_config(config);
    let (result, mut warnings) = simulate_npv(&model, &params, &config.monte_carlo)?;
    warnings.extend(profile_warning(variety, config));

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo NPV Simulation",
        &serde_json::json!({
            "iterations": config.monte_carlo.iterations,
            "seed": result.seed,
            "discount_rate": config.discount_rate.to_string(),
            "horizon_years": config.horizon_years,
            "distributions": {
                "yield_factor": config.monte_carlo.yield_factor,
                "price": config.monte_carlo.price,
                "cost": config.monte_carlo.cost,
                "weather_risk": config.monte_carlo.weather_risk,
                "market_volatility": config.monte_carlo.market_volatility,
            },
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    #[test]
    fn test_percentile_sorted_interpolates() {
        let v: Vec<f64> = (1..=100).map(f64::from).collect();
        // rank = 0.05 * 99 = 4.95 -> 5 + 0.95
        assert!((percentile_sorted(&v, 5.0) - 5.95).abs() < 1e-12);
        assert_eq!(percentile_sorted(&v, 0.0), 1.0);
        assert_eq!(percentile_sorted(&v, 100.0), 100.0);
    }

    #[test]
    fn test_statistics_var_and_expected_shortfall() {
        let mut v: Vec<f64> = (1..=100).rev().map(f64::from).collect();
        let s = compute_statistics(&mut v).unwrap();
        assert!((s.mean - 50.5).abs() < 1e-12);
        assert!((s.median - 50.5).abs() < 1e-12);
        assert!((s.value_at_risk_95 - 5.95).abs() < 1e-12);
        // Samples <= 5.95 are 1..=5
        assert!((s.expected_shortfall - 3.0).abs() < 1e-12);
        assert_eq!(s.probability_positive, 1.0);
        assert_eq!(s.percentiles.p5, s.value_at_risk_95);
    }

    #[test]
    fn test_confidence_interval_levels() {
        let mut v: Vec<f64> = (0..=1000).map(|i| f64::from(i) - 500.0).collect();
        let s = compute_statistics(&mut v).unwrap();
        let levels: Vec<u32> = s.confidence_intervals.keys().copied().collect();
        assert_eq!(levels, vec![90, 95, 99]);
        let ci90 = s.confidence_intervals[&90];
        let ci99 = s.confidence_intervals[&99];
        assert!((ci90.lower + 450.0).abs() < 1e-9);
        assert!((ci90.upper - 450.0).abs() < 1e-9);
        assert!(ci99.lower < ci90.lower && ci99.upper > ci90.upper);
        assert!((s.probability_positive - 500.0 / 1001.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_sample() {
        let mut v = vec![7.0; 10];
        let s = compute_statistics(&mut v).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.expected_shortfall, 7.0);
        assert_eq!(s.histogram.len(), 1);
    }

    #[test]
    fn test_empty_sample() {
        assert!(compute_statistics(&mut []).is_none());
    }

    #[test]
    fn test_histogram_counts_sum_to_sample() {
        let mut v: Vec<f64> = (0..997).map(|i| f64::from(i).sin() * 100.0).collect();
        let s = compute_statistics(&mut v).unwrap();
        let total: u32 = s.histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 997);
        assert_eq!(s.histogram.len(), HISTOGRAM_BINS);
    }

    #[test]
    fn test_iteration_bounds() {
        let mut config = MonteCarloConfig::default();
        config.iterations = 999;
        assert!(config.validate().is_err());
        config.iterations = 50_001;
        assert!(config.validate().is_err());
        config.iterations = 1_000;
        assert!(config.validate().is_ok());
        config.iterations = 50_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_distribution_rejected() {
        let mut config = MonteCarloConfig::default();
        config.price = SampledMultiplier {
            distribution: McDistribution::Normal {
                mean: 1.0,
                std_dev: -0.1,
            },
            floor: None,
            cap: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_floor_applied_to_draws() {
        let sampler = BoundedSampler::new("yield_factor", &SampledMultiplier::normal(0.0, 0.01, 0.5))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(SEED);
        for _ in 0..100 {
            assert_eq!(sampler.draw(&mut rng).unwrap(), Decimal::from_f64_retain(0.5).unwrap());
        }
    }

    #[test]
    fn test_negative_draw_fails_trial() {
        let sampler = BoundedSampler::new("price", &SampledMultiplier::uniform(-2.0, -1.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(SEED);
        assert!(sampler.draw(&mut rng).is_err());
    }

    #[test]
    fn test_chunk_seeds_distinct() {
        let a = chunk_seed(SEED, 0);
        let b = chunk_seed(SEED, 1);
        let c = chunk_seed(SEED + 1, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
