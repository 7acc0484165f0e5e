//! Last-value engine: every sample repeats the final observation.

use crate::error::AppError;
use crate::forecast::context::ContextBatch;
use crate::forecast::engine::{ForecastEngine, ForecastRequest, RawSamples};

pub const NAME: &str = "naive";

#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveEngine;

impl ForecastEngine for NaiveEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn sample(&self, batch: &ContextBatch<'_>, request: &ForecastRequest) -> Result<RawSamples, AppError> {
        batch
            .sequences()
            .iter()
            .enumerate()
            .map(|(idx, seq)| {
                let last = *seq
                    .last()
                    .ok_or_else(|| AppError::engine(format!("Series {idx} has an empty context.")))?;
                Ok(vec![vec![last; request.horizon]; request.num_samples])
            })
            .collect()
    }
}
