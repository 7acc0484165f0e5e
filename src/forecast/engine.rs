//! Boundary around the forecasting capability.
//!
//! The pipeline never forecasts by itself. It hands the context to a
//! [`ForecastEngine`] and gets back `num_samples` candidate trajectories per
//! series. [`ForecastAdapter`] is the only caller of an engine and is where
//! the returned shape is checked: `(series, sample, step)`, always, including
//! for a one-series batch.

use tracing::{debug, info};

use crate::domain::SamplingParams;
use crate::error::AppError;
use crate::forecast::context::{Context, ContextBatch};

/// Everything an engine needs besides the context itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRequest {
    pub horizon: usize,
    pub num_samples: usize,
    pub sampling: SamplingParams,
    /// Seed for any randomness in the engine. Engines must not use global RNG state.
    pub seed: u64,
}

/// Raw engine output, indexed `[series][sample][step]`.
pub type RawSamples = Vec<Vec<Vec<f64>>>;

/// A pretrained (or stand-in) sequence forecaster.
pub trait ForecastEngine {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Draw `request.num_samples` trajectories of length `request.horizon`
    /// for every sequence of `batch`, in batch order.
    fn sample(&self, batch: &ContextBatch<'_>, request: &ForecastRequest) -> Result<RawSamples, AppError>;
}

/// Shape-checked samples, stored densely as `(series, sample, step)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTensor {
    num_series: usize,
    num_samples: usize,
    horizon: usize,
    values: Vec<f64>,
}

impl SampleTensor {
    /// Flatten nested samples, requiring exactly the expected shape.
    pub fn from_nested(
        nested: RawSamples,
        num_series: usize,
        num_samples: usize,
        horizon: usize,
    ) -> Result<Self, String> {
        if nested.len() != num_series {
            return Err(format!(
                "expected {num_series} series, got {}",
                nested.len()
            ));
        }

        let mut values = Vec::with_capacity(num_series * num_samples * horizon);
        for (s, samples) in nested.into_iter().enumerate() {
            if samples.len() != num_samples {
                return Err(format!(
                    "series {s}: expected {num_samples} samples, got {}",
                    samples.len()
                ));
            }
            for (k, trajectory) in samples.into_iter().enumerate() {
                if trajectory.len() != horizon {
                    return Err(format!(
                        "series {s}, sample {k}: expected {horizon} steps, got {}",
                        trajectory.len()
                    ));
                }
                if let Some(step) = trajectory.iter().position(|v| !v.is_finite()) {
                    return Err(format!("series {s}, sample {k}, step {step}: non-finite value"));
                }
                values.extend(trajectory);
            }
        }

        Ok(Self {
            num_series,
            num_samples,
            horizon,
            values,
        })
    }

    /// `(num_series, num_samples, horizon)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.num_series, self.num_samples, self.horizon)
    }

    pub fn num_series(&self) -> usize {
        self.num_series
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// One trajectory.
    pub fn trajectory(&self, series: usize, sample: usize) -> &[f64] {
        let start = (series * self.num_samples + sample) * self.horizon;
        &self.values[start..start + self.horizon]
    }

    /// All trajectories of one series, in sample order.
    pub fn series(&self, series: usize) -> impl Iterator<Item = &[f64]> {
        (0..self.num_samples).map(move |k| self.trajectory(series, k))
    }
}

/// Calls an engine and enforces the output contract.
pub struct ForecastAdapter<'e> {
    engine: &'e dyn ForecastEngine,
}

impl<'e> ForecastAdapter<'e> {
    pub fn new(engine: &'e dyn ForecastEngine) -> Self {
        Self { engine }
    }

    /// Forecast every series of `context`.
    ///
    /// Any engine failure, and any output not shaped
    /// `(context.len(), num_samples, horizon)`, is an `EngineError`.
    pub fn forecast(&self, context: &Context, request: &ForecastRequest) -> Result<SampleTensor, AppError> {
        if request.horizon == 0 {
            return Err(AppError::engine("Forecast horizon must be > 0."));
        }
        if request.num_samples == 0 {
            return Err(AppError::engine("Number of samples must be > 0."));
        }

        let batch = context.batch();
        info!(
            engine = self.engine.name(),
            series = batch.len(),
            horizon = request.horizon,
            num_samples = request.num_samples,
            temperature = request.sampling.temperature,
            "invoking forecast engine"
        );

        let raw = self.engine.sample(&batch, request).map_err(|e| {
            AppError::engine(format!("Engine `{}` failed: {}", self.engine.name(), e.message()))
        })?;

        let tensor = SampleTensor::from_nested(raw, batch.len(), request.num_samples, request.horizon)
            .map_err(|e| {
                AppError::engine(format!(
                    "Engine `{}` returned malformed samples: {e}",
                    self.engine.name()
                ))
            })?;

        debug!(shape = ?tensor.shape(), "engine samples received");
        Ok(tensor)
    }
}
