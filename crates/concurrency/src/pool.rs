//! Stress worker pool
//!
//! Spawns `2 * pair_count` OS threads, interleaving roles by slot
//! (inverter, swapper, inverter, ...), and joins all of them before
//! returning. A single `parking_lot::Mutex` guards the buffer and the
//! corruption counter together, so every worker serializes on it. This caps
//! throughput at one critical section at a time across the pool; the
//! stress pattern wants maximal interleaving on the same cells, not raw
//! operation rate.
//!
//! ## Termination
//!
//! ```text
//! deadline                    <- workers stop starting new iterations
//! deadline + one section/thread <- latest possible join
//! ```

use crate::buffer::StressBuffer;
use crate::worker::{StressRegion, Worker, WorkerReport, WorkerRole};
use memstress_core::config::MAX_PAIR_COUNT;
use memstress_core::{Error, Result};
use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of a joined pool run.
#[derive(Debug, Clone)]
pub struct PoolReport {
    /// One entry per worker, in slot order
    pub workers: Vec<WorkerReport>,
    /// Final corruption count, read after every worker joined
    pub corruptions: u64,
    /// Wall time from first spawn to last join
    pub elapsed: Duration,
}

impl PoolReport {
    /// Critical sections completed across the pool.
    pub fn total_operations(&self) -> u64 {
        self.workers.iter().map(|w| w.operations).sum()
    }

    /// Critical sections completed by workers of `role`.
    pub fn operations_for(&self, role: WorkerRole) -> u64 {
        self.workers
            .iter()
            .filter(|w| w.role == role)
            .map(|w| w.operations)
            .sum()
    }

    /// Number of workers that ran `role`.
    pub fn workers_for(&self, role: WorkerRole) -> usize {
        self.workers.iter().filter(|w| w.role == role).count()
    }
}

/// Fixed-size group of inverter and swapper threads.
#[derive(Debug, Clone, Copy)]
pub struct StressWorkerPool {
    pair_count: usize,
}

impl StressWorkerPool {
    /// Pool of `pair_count` inverters and `pair_count` swappers.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `pair_count` is 0 or above `MAX_PAIR_COUNT`.
    pub fn new(pair_count: usize) -> Result<Self> {
        if pair_count == 0 || pair_count > MAX_PAIR_COUNT {
            return Err(Error::invalid_config(format!(
                "pair count must be in 1..={}, got {}",
                MAX_PAIR_COUNT, pair_count
            )));
        }
        Ok(Self { pair_count })
    }

    /// Threads spawned per run.
    pub fn worker_count(&self) -> usize {
        self.pair_count * 2
    }

    /// Role for every slot, in spawn order.
    pub fn roles(&self) -> impl Iterator<Item = WorkerRole> {
        (0..self.worker_count()).map(WorkerRole::for_slot)
    }

    /// Stress `buffer` until `deadline`, then join every worker.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for an empty buffer, `WorkerSpawn` if the OS refuses a
    /// thread, `WorkerPanicked` if one dies. In every case the threads that
    /// did start are joined first.
    pub fn run(&self, buffer: &mut StressBuffer, deadline: Instant) -> Result<PoolReport> {
        if buffer.is_empty() {
            return Err(Error::invalid_config("cannot stress an empty buffer"));
        }
        let len = buffer.len();
        let started = Instant::now();
        let region = Mutex::new(StressRegion::new(buffer));

        info!(
            target: "memstress::pool",
            workers = self.worker_count(),
            len,
            "Starting stress workers"
        );

        let workers = thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.worker_count());
            let mut spawn_error = None;
            for slot in 0..self.worker_count() {
                let worker = Worker::new(slot, len);
                let region = &region;
                let spawned = thread::Builder::new()
                    .name(worker.thread_name())
                    .spawn_scoped(s, move || worker.run(region, deadline));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_error = Some(e);
                        break;
                    }
                }
            }

            let mut reports = Vec::with_capacity(handles.len());
            let mut panicked = None;
            for handle in handles {
                let name = handle.thread().name().unwrap_or("stress").to_string();
                match handle.join() {
                    Ok(report) => {
                        debug!(
                            target: "memstress::pool",
                            slot = report.slot,
                            role = %report.role,
                            operations = report.operations,
                            "Worker finished"
                        );
                        reports.push(report);
                    }
                    Err(_) => {
                        panicked.get_or_insert(name);
                    }
                }
            }

            if let Some(e) = spawn_error {
                return Err(Error::WorkerSpawn(e));
            }
            if let Some(name) = panicked {
                return Err(Error::WorkerPanicked { name });
            }
            Ok(reports)
        })?;

        let corruptions = region.into_inner().corruptions.value();
        let elapsed = started.elapsed();
        info!(
            target: "memstress::pool",
            corruptions,
            elapsed_ms = elapsed.as_millis() as u64,
            "All stress workers joined"
        );

        Ok(PoolReport {
            workers,
            corruptions,
            elapsed,
        })
    }
}
