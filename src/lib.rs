//! `ts-forecast` library crate.
//!
//! The binary (`ts-forecast`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - forecasting engines and resource monitors can be swapped in through traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod engines;
pub mod error;
pub mod forecast;
pub mod io;
pub mod monitor;
