//! Run orchestration
//!
//! ```text
//! 1. prepare()  - validate config, hardware guard, query memory, size buffer
//! 2. allocate   - fallible reservation; failure ends the run, no threads
//! 3. fill       - 2 * pair_count fill threads, joined
//! 4. verify     - optional single pass over the fresh pattern
//! 5. stress     - 2 * pair_count workers until start + duration, joined
//! 6. report     - corruption count read after the join; buffer dropped
//! ```
//!
//! The buffer is owned by `execute_until` and released when it returns,
//! whichever step fails.

use crate::report::{RunPlan, RunReport};
use memstress_concurrency::{verify_pattern, PatternFiller, StressBuffer, StressWorkerPool};
use memstress_core::{
    buffer_len, Error, MemoryInfoProvider, ProcessMemory, Result, RunConfig,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Knobs that are not part of the run configuration proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Reject `pair_count` above `std::thread::available_parallelism()`
    pub enforce_hardware_limit: bool,
    /// Check the pattern once after filling, before stressing
    pub verify_fill: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            enforce_hardware_limit: true,
            verify_fill: true,
        }
    }
}

/// Hooks for reporting progress between phases.
pub trait RunObserver {
    /// Buffer allocated, fill about to start.
    fn on_fill_start(&mut self, _plan: &RunPlan) {}

    /// Fill joined (and verified, if enabled).
    fn on_fill_complete(&mut self, _mismatches: Option<usize>) {}

    /// Stress workers about to spawn.
    fn on_stress_start(&mut self, _deadline: Instant) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// Drives one stress run from memory query to final report.
pub struct Runner<P: MemoryInfoProvider> {
    config: RunConfig,
    provider: P,
    options: RunOptions,
}

impl<P: MemoryInfoProvider> Runner<P> {
    /// Runner with default options.
    pub fn new(config: RunConfig, provider: P) -> Self {
        Self::with_options(config, provider, RunOptions::default())
    }

    /// Runner with explicit options.
    pub fn with_options(config: RunConfig, provider: P, options: RunOptions) -> Self {
        Self {
            config,
            provider,
            options,
        }
    }

    /// Configuration this runner was built with.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Validate and size the run without allocating anything.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a bad config, an empty buffer, or a failed
    /// hardware guard; `PlatformQuery` if memory cannot be read;
    /// `AddressSpace` if the size does not fit in `usize`.
    pub fn prepare(&self) -> Result<RunPlan> {
        self.config.validate()?;

        if self.options.enforce_hardware_limit {
            match std::thread::available_parallelism() {
                Ok(threads) => self.config.check_hardware(threads.get())?,
                Err(e) => warn!(
                    target: "memstress::run",
                    error = %e,
                    "Hardware concurrency unknown, skipping pair count guard"
                ),
            }
        }

        let available_bytes = self.provider.available_bytes()?;
        let len = buffer_len(self.config.memory_percent, available_bytes)?;

        info!(
            target: "memstress::run",
            provider = self.provider.name(),
            available_bytes,
            percent = self.config.memory_percent,
            buffer_len = len,
            "Sized stress buffer"
        );

        Ok(RunPlan {
            config: self.config,
            provider: self.provider.name(),
            available_bytes,
            buffer_len: len,
        })
    }

    /// Prepare and execute with the configured duration.
    pub fn run(&self, observer: &mut dyn RunObserver) -> Result<RunReport> {
        let plan = self.prepare()?;
        self.execute(plan, observer)
    }

    /// Execute a plan; the stress deadline is set when the stress phase starts.
    pub fn execute(&self, plan: RunPlan, observer: &mut dyn RunObserver) -> Result<RunReport> {
        let duration = plan.config.duration();
        self.execute_with(plan, observer, move || {
            Instant::now().checked_add(duration).ok_or_else(|| {
                Error::invalid_config(format!("duration {:?} overflows the clock", duration))
            })
        })
    }

    /// Execute a plan against a fixed deadline.
    ///
    /// Everything else is identical to [`Runner::execute`]; fill time counts
    /// against the deadline.
    pub fn execute_until(
        &self,
        plan: RunPlan,
        deadline: Instant,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport> {
        self.execute_with(plan, observer, move || Ok(deadline))
    }

    fn execute_with(
        &self,
        plan: RunPlan,
        observer: &mut dyn RunObserver,
        deadline: impl FnOnce() -> Result<Instant>,
    ) -> Result<RunReport> {
        // RunPlan fields are public; re-check before sizing thread groups.
        plan.config.validate()?;
        let filler = PatternFiller::new(plan.config.pair_count)?;
        let pool = StressWorkerPool::new(plan.config.pair_count)?;

        let reserved = StressBuffer::reserve(plan.buffer_len)?;
        observer.on_fill_start(&plan);

        let fill_started = Instant::now();
        let mut buffer = filler.fill_reserved(reserved)?;
        let fill_elapsed = fill_started.elapsed();
        info!(
            target: "memstress::run",
            threads = filler.thread_count(),
            elapsed_ms = fill_elapsed.as_millis() as u64,
            "Buffer filled"
        );
        debug!(
            target: "memstress::run",
            virtual_bytes = ?ProcessMemory::virtual_bytes(),
            "Process memory after fill"
        );

        let fill_mismatches = if self.options.verify_fill {
            let mismatches = verify_pattern(&buffer);
            if mismatches > 0 {
                warn!(
                    target: "memstress::run",
                    mismatches,
                    "Pattern mismatches found before stressing"
                );
            }
            Some(mismatches)
        } else {
            None
        };
        observer.on_fill_complete(fill_mismatches);

        let deadline = deadline()?;
        observer.on_stress_start(deadline);
        let pool_report = pool.run(&mut buffer, deadline)?;

        let process_virtual_bytes = ProcessMemory::virtual_bytes();
        debug!(
            target: "memstress::run",
            virtual_bytes = ?process_virtual_bytes,
            "Process memory after stress"
        );
        drop(buffer);

        Ok(RunReport {
            plan,
            fill_elapsed,
            fill_mismatches,
            pool: pool_report,
            process_virtual_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memstress_core::FixedMemory;

    fn runner(config: RunConfig, available: u64) -> Runner<FixedMemory> {
        let options = RunOptions {
            enforce_hardware_limit: false,
            verify_fill: true,
        };
        Runner::with_options(config, FixedMemory(available), options)
    }

    #[test]
    fn prepare_sizes_half_of_two_gigabytes() {
        let plan = runner(RunConfig::new(2, 50, 1).unwrap(), 2_000_000_000)
            .prepare()
            .unwrap();
        assert_eq!(plan.buffer_len, 1_000_000_000);
        assert_eq!(plan.worker_count(), 4);
        assert_eq!(plan.provider, "fixed");
    }

    #[test]
    fn prepare_rejects_bad_percent() {
        for percent in [0u8, 101] {
            let config = RunConfig {
                pair_count: 1,
                memory_percent: percent,
                duration_minutes: 1,
            };
            let err = runner(config, 1 << 20).prepare().unwrap_err();
            assert!(err.is_config(), "percent {} accepted", percent);
        }
    }

    #[test]
    fn prepare_rejects_empty_buffer() {
        let err = runner(RunConfig::new(1, 1, 1).unwrap(), 10)
            .prepare()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn hardware_guard_applies_when_enabled() {
        let config = RunConfig::new(memstress_core::config::MAX_PAIR_COUNT, 50, 1).unwrap();
        let runner = Runner::new(config, FixedMemory(1 << 20));
        assert!(runner.prepare().unwrap_err().is_config());
    }

    #[test]
    fn execute_rejects_unvalidated_plan() {
        let runner = runner(RunConfig::new(1, 100, 1).unwrap(), 1024);
        let mut plan = runner.prepare().unwrap();
        plan.config.pair_count = usize::MAX;
        let err = runner
            .execute_until(plan, Instant::now(), &mut SilentObserver)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn execute_rejects_clock_overflowing_duration() {
        let runner = runner(RunConfig::new(1, 100, 1).unwrap(), 1024);
        let mut plan = runner.prepare().unwrap();
        // Set after prepare, so only execute stands between it and the clock.
        plan.config.duration_minutes = u64::MAX / 60;
        let err = runner.execute(plan, &mut SilentObserver).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn execute_until_short_deadline() {
        let runner = runner(RunConfig::new(1, 100, 1).unwrap(), 4096);
        let plan = runner.prepare().unwrap();
        let deadline = Instant::now() + std::time::Duration::from_millis(20);
        let report = runner
            .execute_until(plan, deadline, &mut SilentObserver)
            .unwrap();
        assert_eq!(report.fill_mismatches, Some(0));
        assert_eq!(report.corruptions(), 0);
        assert!(report.is_clean());
        assert_eq!(report.pool.workers.len(), 2);
    }
}
