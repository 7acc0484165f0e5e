//! Sample aggregation: one point forecast per series per step.
//!
//! Only the mean is supported. Consumers expect a single estimate per step.

use crate::forecast::engine::SampleTensor;

/// Point forecasts indexed `[series][step]`, in sample-tensor series order.
pub type PointForecasts = Vec<Vec<f64>>;

/// Reduce the sample axis by arithmetic mean.
///
/// Uses a running mean so that one sample passes through unchanged and
/// identical samples aggregate to exactly that value. Each update scales by
/// `1/n` before subtracting, so finite samples never overflow.
pub fn aggregate(samples: &SampleTensor) -> PointForecasts {
    (0..samples.num_series())
        .map(|s| {
            let mut mean = vec![0.0; samples.horizon()];
            for (k, trajectory) in samples.series(s).enumerate() {
                let n = (k + 1) as f64;
                for (m, &x) in mean.iter_mut().zip(trajectory) {
                    *m += x / n - *m / n;
                }
            }
            mean
        })
        .collect()
}
