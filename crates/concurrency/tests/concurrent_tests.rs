//! Concurrent/Multi-threaded Tests for memstress-concurrency
//!
//! These tests verify correct behavior under actual concurrent execution:
//!
//! 1. **Pool Lifecycle** - All `2N` workers spawn, join, and stop near the deadline
//! 2. **Mutual Exclusion** - No mutation is lost while workers race for the lock
//! 3. **Healthy Harness** - Zero corruptions on working memory
//! 4. **Parallel Fill** - Disjoint partitions produce the full pattern
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --test concurrent_tests
//! cargo test --test concurrent_tests -- --nocapture --test-threads=1  # sequential for debugging
//! ```

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use memstress_concurrency::{
    pattern_byte, verify_pattern, PatternFiller, StressBuffer, StressRegion, StressWorkerPool,
    Worker, WorkerRole,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Allow generous slack for loaded CI machines.
const JOIN_SLACK: Duration = Duration::from_secs(2);

fn filled_buffer(len: usize) -> StressBuffer {
    let mut buffer = StressBuffer::allocate(len).unwrap();
    PatternFiller::new(4).unwrap().fill(&mut buffer).unwrap();
    buffer
}

fn only_pattern_bytes(buffer: &StressBuffer) -> bool {
    buffer.to_vec().iter().all(|&b| b == 0x55 || b == 0xAA)
}

// ============================================================================
// SECTION 1: Pool Lifecycle
// ============================================================================

mod pool_lifecycle {
    use super::*;

    #[test]
    fn test_two_pairs_spawn_four_workers() {
        let pool = StressWorkerPool::new(2).unwrap();
        let mut buffer = filled_buffer(4096);
        let deadline = Instant::now() + Duration::from_millis(50);

        let report = pool.run(&mut buffer, deadline).unwrap();

        assert_eq!(report.workers.len(), 4);
        assert_eq!(report.workers_for(WorkerRole::Inverter), 2);
        assert_eq!(report.workers_for(WorkerRole::Swapper), 2);
    }

    #[test]
    fn test_terminates_within_bounded_overrun() {
        let pool = StressWorkerPool::new(4).unwrap();
        let mut buffer = filled_buffer(1 << 16);
        let deadline = Instant::now() + Duration::from_millis(100);

        pool.run(&mut buffer, deadline).unwrap();

        let finished = Instant::now();
        assert!(finished >= deadline, "pool returned before the deadline");
        assert!(
            finished <= deadline + JOIN_SLACK,
            "pool overran the deadline by {:?}",
            finished - deadline
        );
    }

    #[test]
    fn test_every_worker_made_progress() {
        let pool = StressWorkerPool::new(2).unwrap();
        let mut buffer = filled_buffer(1024);
        let deadline = Instant::now() + Duration::from_millis(200);

        let report = pool.run(&mut buffer, deadline).unwrap();

        // parking_lot is not strictly fair, but over 200ms every thread gets the lock.
        for worker in &report.workers {
            assert!(worker.operations > 0, "slot {} never ran", worker.slot);
        }
        assert_eq!(
            report.total_operations(),
            report.operations_for(WorkerRole::Inverter) + report.operations_for(WorkerRole::Swapper)
        );
    }

    #[test]
    fn test_buffer_usable_after_run() {
        let pool = StressWorkerPool::new(1).unwrap();
        let mut buffer = filled_buffer(256);
        pool.run(&mut buffer, Instant::now() + Duration::from_millis(20))
            .unwrap();

        // Exclusive access is back with the caller.
        buffer.write(0, 0x00);
        assert_eq!(buffer.read(0), 0x00);
    }
}

// ============================================================================
// SECTION 2: Mutual Exclusion
// ============================================================================

mod mutual_exclusion {
    use super::*;

    /// Inverters only: every inversion toggles exactly one cell away from or
    /// back to the pattern. If the lock ever let two read-modify-write cycles
    /// overlap on a cell, one toggle would be lost and the parity of
    /// mismatched cells would drift from the parity of total operations.
    #[test]
    fn test_no_lost_inversions() {
        let len = 64; // small, so collisions on the same cell are frequent
        let mut buffer = filled_buffer(len);
        let deadline = Instant::now() + Duration::from_millis(150);

        let total_ops: u64 = {
            let region = Mutex::new(StressRegion::new(&mut buffer));
            let ops = thread::scope(|s| {
                let handles: Vec<_> = [0usize, 2, 4, 6]
                    .into_iter()
                    .map(|slot| {
                        let worker = Worker::new(slot, len);
                        assert_eq!(worker.role(), WorkerRole::Inverter);
                        let region = &region;
                        s.spawn(move || worker.run(region, deadline))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap().operations)
                    .sum()
            });
            assert_eq!(region.into_inner().corruptions.value(), 0);
            ops
        };

        let mismatched = verify_pattern(&buffer) as u64;
        assert_eq!(mismatched % 2, total_ops % 2);
    }

    /// Swappers only: the multiset of bytes is invariant under any sequence
    /// of serialized swaps.
    #[test]
    fn test_swaps_preserve_byte_counts() {
        let len = 128;
        let mut buffer = filled_buffer(len);
        let deadline = Instant::now() + Duration::from_millis(100);

        {
            let region = Mutex::new(StressRegion::new(&mut buffer));
            thread::scope(|s| {
                for slot in [1usize, 3, 5] {
                    let worker = Worker::new(slot, len);
                    let region = &region;
                    s.spawn(move || worker.run(region, deadline));
                }
            });
            assert_eq!(region.into_inner().corruptions.value(), 0);
        }

        let bytes = buffer.to_vec();
        assert_eq!(bytes.iter().filter(|&&b| b == 0x55).count(), len / 2);
        assert_eq!(bytes.iter().filter(|&&b| b == 0xAA).count(), len / 2);
    }
}

// ============================================================================
// SECTION 3: Healthy Harness
// ============================================================================

mod healthy_harness {
    use super::*;

    #[test]
    fn test_zero_corruptions_on_working_memory() {
        let pool = StressWorkerPool::new(4).unwrap();
        let mut buffer = filled_buffer(1 << 20);
        let deadline = Instant::now() + Duration::from_millis(200);

        let report = pool.run(&mut buffer, deadline).unwrap();

        assert_eq!(report.corruptions, 0);
        assert!(report.workers.iter().all(|w| w.corruptions == 0));
        assert!(report.total_operations() > 0);
    }

    #[test]
    fn test_mutations_stay_within_pattern_alphabet() {
        let pool = StressWorkerPool::new(2).unwrap();
        let mut buffer = filled_buffer(512);
        pool.run(&mut buffer, Instant::now() + Duration::from_millis(50))
            .unwrap();

        // !0x55 == 0xAA and swaps only move existing bytes.
        assert!(only_pattern_bytes(&buffer));
    }
}

// ============================================================================
// SECTION 4: Parallel Fill
// ============================================================================

mod parallel_fill {
    use super::*;

    #[test]
    fn test_large_fill_many_partitions() {
        let len = (8 << 20) + 3;
        let mut buffer = StressBuffer::allocate(len).unwrap();
        PatternFiller::new(16).unwrap().fill(&mut buffer).unwrap();
        assert_eq!(verify_pattern(&buffer), 0);
    }

    #[test]
    fn test_fill_matches_pattern_at_partition_edges() {
        let len = 1000;
        let filler = PatternFiller::new(3).unwrap();
        let mut buffer = StressBuffer::allocate(len).unwrap();
        filler.fill(&mut buffer).unwrap();

        for range in memstress_concurrency::partition_ranges(len, 3) {
            if range.is_empty() {
                continue;
            }
            assert_eq!(buffer.read(range.start), pattern_byte(range.start));
            assert_eq!(buffer.read(range.end - 1), pattern_byte(range.end - 1));
        }
    }

    #[test]
    fn test_concurrent_independent_fills() {
        let handles: Vec<_> = (1..=4)
            .map(|partitions| {
                thread::spawn(move || {
                    let mut buffer = StressBuffer::allocate(10_000).unwrap();
                    PatternFiller::new(partitions)
                        .unwrap()
                        .fill(&mut buffer)
                        .unwrap();
                    verify_pattern(&buffer)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }
    }
}
