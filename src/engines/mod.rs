//! Built-in forecasting capabilities and the `model_name` registry.
//!
//! - `random-walk`: seeded Gaussian random-walk sampler (`random_walk`)
//! - `naive`: repeats the last observation (`naive`)
//!
//! Any other model name is reported as unavailable.

pub mod naive;
pub mod random_walk;

pub use naive::NaiveEngine;
pub use random_walk::RandomWalkEngine;

use crate::error::AppError;
use crate::forecast::engine::ForecastEngine;

/// Resolve a configured `model_name` to an engine.
pub fn engine_for_model(model_name: &str) -> Result<Box<dyn ForecastEngine>, AppError> {
    match model_name.trim() {
        random_walk::NAME => Ok(Box::new(RandomWalkEngine)),
        naive::NAME => Ok(Box::new(NaiveEngine)),
        other => Err(AppError::engine(format!(
            "Forecasting model `{other}` is not available (known: {}, {}).",
            random_walk::NAME,
            naive::NAME
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn resolves_known_names() {
        assert_eq!(engine_for_model("naive").unwrap().name(), "naive");
        assert_eq!(engine_for_model(" random-walk ").unwrap().name(), "random-walk");
    }

    #[test]
    fn unknown_model_is_engine_error() {
        let err = engine_for_model("chronos-t5-tiny").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }
}
