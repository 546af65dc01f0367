//! memstress - Memory hardware stress and soak generator
//!
//! memstress allocates a buffer sized as a share of free memory plus swap,
//! fills it with an alternating `0x55`/`0xAA` pattern, then races
//! bit-inverting and byte-swapping threads over it until a deadline. Every
//! mutation is re-read inside the same critical section; a mismatch is a
//! corruption event.
//!
//! # Quick Start
//!
//! ```no_run
//! use memstress::{RunConfig, Runner, SilentObserver, SystemMemory};
//!
//! let config = RunConfig::new(4, 60, 1)?;
//! let runner = Runner::new(config, SystemMemory::detect()?);
//! let report = runner.run(&mut SilentObserver)?;
//! println!("corruptions: {}", report.corruptions());
//! # Ok::<(), memstress::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `memstress-core`: errors, configuration, memory providers, sizing
//! - `memstress-concurrency`: buffer, fill, workers, pool
//! - `memstress-engine`: the run sequence tying them together

pub use memstress_concurrency::{
    partition_ranges, pattern_byte, verify_pattern, CorruptionCounter, Mutation, PatternFiller,
    PoolReport, ReservedBuffer, StressBuffer, StressRegion, StressWorkerPool, Worker,
    WorkerReport, WorkerRole,
};
pub use memstress_core::{
    buffer_len, size_for, Error, FixedMemory, MemoryInfoProvider, ProcessMemory, Result,
    RunConfig, SystemMemory,
};
pub use memstress_engine::{RunObserver, RunOptions, RunPlan, RunReport, Runner, SilentObserver};
