//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dataset schema (`Schema`, `TimeDtype`, `TimeValue`)
//! - the model configuration and sampling controls (`ModelConfig`, `SamplingParams`)
//! - the run's filesystem layout (`Paths`)

pub mod types;

pub use types::*;
