//! Concurrency layer for memstress
//!
//! This crate implements the buffer-mutation engine:
//! - StressBuffer: Owned byte region with volatile accessors
//! - PatternFiller: Lock-free parallel fill over disjoint partitions
//! - StressWorkerPool: Inverter/swapper threads racing for one mutex
//! - CorruptionCounter: Self-check mismatches, guarded by that same mutex

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod counter;
pub mod fill;
pub mod pool;
pub mod worker;

pub use buffer::{ReservedBuffer, StressBuffer};
pub use counter::CorruptionCounter;
pub use fill::{partition_ranges, pattern_byte, verify_pattern, PatternFiller};
pub use pool::{PoolReport, StressWorkerPool};
pub use worker::{Mutation, StressRegion, Worker, WorkerReport, WorkerRole};
