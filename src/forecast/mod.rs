//! Forecasting core.
//!
//! Responsibilities:
//!
//! - group validated history into a per-series context (`context`)
//! - call the forecasting capability and check its output (`engine`)
//! - reduce samples to point forecasts (`aggregate`)
//! - join point forecasts with ids and future timestamps (`assemble`)

pub mod aggregate;
pub mod assemble;
pub mod context;
pub mod engine;

pub use aggregate::*;
pub use assemble::*;
pub use context::*;
pub use engine::*;
