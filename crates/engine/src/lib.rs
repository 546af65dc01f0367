//! Run engine for memstress
//!
//! This crate orchestrates the lower layers into a single run:
//! - Runner: memory query, sizing, allocation, fill, stress, report
//! - RunPlan / RunReport: what was decided and what was observed
//!
//! The engine is the only component that owns the stress buffer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod report;
pub mod runner;

pub use report::{RunPlan, RunReport};
pub use runner::{RunObserver, RunOptions, Runner, SilentObserver};
