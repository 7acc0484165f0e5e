//! Gaussian random-walk sampler.
//!
//! Each trajectory starts from the last observed value and adds i.i.d.
//! normal steps whose scale is the standard deviation of the series' first
//! differences, multiplied by `sqrt(temperature)`.
//!
//! Truncation (`top_k`, `top_p`) keeps the trajectories whose final value is
//! closest to the median final value, then cycles them to fill `num_samples`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;

use crate::error::AppError;
use crate::forecast::context::ContextBatch;
use crate::forecast::engine::{ForecastEngine, ForecastRequest, RawSamples};

pub const NAME: &str = "random-walk";

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalkEngine;

impl ForecastEngine for RandomWalkEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn sample(&self, batch: &ContextBatch<'_>, request: &ForecastRequest) -> Result<RawSamples, AppError> {
        // Series are independent; results are collected back in batch order.
        batch
            .sequences()
            .par_iter()
            .enumerate()
            .map(|(idx, seq)| sample_series(seq, idx, request))
            .collect()
    }
}

fn sample_series(seq: &[f64], idx: usize, request: &ForecastRequest) -> Result<Vec<Vec<f64>>, AppError> {
    let last = *seq
        .last()
        .ok_or_else(|| AppError::engine(format!("Series {idx} has an empty context.")))?;

    let step_sigma = diff_std(seq) * request.sampling.temperature.sqrt();
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::engine(format!("Noise distribution error: {e}")))?;
    let mut rng = StdRng::seed_from_u64(series_seed(request.seed, idx));

    let mut trajectories: Vec<Vec<f64>> = (0..request.num_samples)
        .map(|_| {
            let mut level = last;
            (0..request.horizon)
                .map(|_| {
                    level += step_sigma * normal.sample(&mut rng);
                    level
                })
                .collect()
        })
        .collect();

    let keep = truncation_size(request);
    if keep < trajectories.len() {
        trajectories = truncate(trajectories, keep, request.num_samples);
    }
    Ok(trajectories)
}

/// How many trajectories survive top-k / top-p truncation.
fn truncation_size(request: &ForecastRequest) -> usize {
    let n = request.num_samples;
    let by_k = request.sampling.top_k.unwrap_or(n);
    let by_p = request
        .sampling
        .top_p
        .map(|p| (p * n as f64).ceil() as usize)
        .unwrap_or(n);
    by_k.min(by_p).max(1).min(n)
}

fn truncate(trajectories: Vec<Vec<f64>>, keep: usize, num_samples: usize) -> Vec<Vec<f64>> {
    let finals: Vec<f64> = trajectories
        .iter()
        .map(|t| t.last().copied().unwrap_or(0.0))
        .collect();
    let median = median(&finals);

    let mut order: Vec<usize> = (0..trajectories.len()).collect();
    // Stable sort keeps the original sample order among ties.
    order.sort_by(|&a, &b| {
        let da = (finals[a] - median).abs();
        let db = (finals[b] - median).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(keep);

    (0..num_samples)
        .map(|i| trajectories[order[i % keep]].clone())
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Sample standard deviation of first differences (0 for fewer than 3 points).
fn diff_std(seq: &[f64]) -> f64 {
    if seq.len() < 3 {
        return 0.0;
    }
    let diffs: Vec<f64> = seq.windows(2).map(|w| w[1] - w[0]).collect();
    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Per-series seed. A fixed mix, so a given `seed_value` reproduces the same
/// forecasts across builds.
fn series_seed(seed: u64, idx: usize) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    seed ^ (idx as u64).wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)
}
