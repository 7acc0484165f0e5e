//! Input/output helpers.
//!
//! - schema + model config loading (`config`)
//! - CSV directory ingest (`ingest`)
//! - schema-driven validation of inputs and predictions (`validate`)
//! - predictions CSV export (`export`)
//! - append-only error log (`error_log`)

pub mod config;
pub mod error_log;
pub mod export;
pub mod ingest;
pub mod validate;

pub use config::*;
pub use error_log::*;
pub use export::*;
pub use ingest::*;
pub use validate::*;
