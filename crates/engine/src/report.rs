//! Plan and outcome of a stress run

use memstress_concurrency::{PoolReport, WorkerRole};
use memstress_core::RunConfig;
use std::time::Duration;

/// Everything decided before memory is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Validated configuration
    pub config: RunConfig,
    /// Provider that produced the reading
    pub provider: &'static str,
    /// Free RAM + swap reported by the provider, in bytes
    pub available_bytes: u64,
    /// Stress buffer length in bytes
    pub buffer_len: usize,
}

impl RunPlan {
    /// Threads spawned by the stress phase.
    pub fn worker_count(&self) -> usize {
        self.config.worker_count()
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Plan the run executed
    pub plan: RunPlan,
    /// Time spent filling the buffer
    pub fill_elapsed: Duration,
    /// Pattern mismatches found right after the fill, when verification ran
    pub fill_mismatches: Option<usize>,
    /// Stress phase outcome
    pub pool: PoolReport,
    /// Process virtual size after the stress phase, if the OS reports it
    pub process_virtual_bytes: Option<u64>,
}

impl RunReport {
    /// Corruption events counted by the stress workers.
    pub fn corruptions(&self) -> u64 {
        self.pool.corruptions
    }

    /// True when neither the fill check nor the stress phase saw corruption.
    pub fn is_clean(&self) -> bool {
        self.corruptions() == 0 && self.fill_mismatches.unwrap_or(0) == 0
    }

    /// Inversions completed.
    pub fn inversions(&self) -> u64 {
        self.pool.operations_for(WorkerRole::Inverter)
    }

    /// Swaps completed.
    pub fn swaps(&self) -> u64 {
        self.pool.operations_for(WorkerRole::Swapper)
    }
}
