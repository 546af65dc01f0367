//! Stress worker behaviors
//!
//! Each worker loops until the deadline. One iteration is a full critical
//! section: lock, pick position(s), mutate, re-read, count a mismatch,
//! unlock. The deadline is only checked between iterations, so a write is
//! always verified before the worker may stop; the price is an overrun of
//! at most one critical section per thread.

use crate::buffer::StressBuffer;
use crate::counter::CorruptionCounter;
use parking_lot::Mutex;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Instant;
use tracing::trace;

/// Behavior assigned to a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerRole {
    /// Complements one random byte per iteration
    Inverter,
    /// Exchanges two random bytes per iteration
    Swapper,
}

impl WorkerRole {
    /// Even slots invert, odd slots swap.
    pub fn for_slot(slot: usize) -> Self {
        if slot % 2 == 0 {
            WorkerRole::Inverter
        } else {
            WorkerRole::Swapper
        }
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Inverter => write!(f, "inverter"),
            WorkerRole::Swapper => write!(f, "swapper"),
        }
    }
}

/// Everything the stress mutex guards: the buffer and the corruption count.
#[derive(Debug)]
pub struct StressRegion<'a> {
    /// Buffer under stress
    pub buffer: &'a mut StressBuffer,
    /// Mismatches seen so far
    pub corruptions: CorruptionCounter,
}

impl<'a> StressRegion<'a> {
    /// Wrap a buffer with a zeroed counter.
    pub fn new(buffer: &'a mut StressBuffer) -> Self {
        Self {
            buffer,
            corruptions: CorruptionCounter::new(),
        }
    }
}

/// Result of one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Byte at `pos` complemented
    Inverted {
        /// Position touched
        pos: usize,
        /// Re-read matched
        verified: bool,
    },
    /// Bytes at `first` and `second` exchanged
    Swapped {
        /// First position
        first: usize,
        /// Second position, may equal `first`
        second: usize,
        /// Both re-reads matched
        verified: bool,
    },
}

impl Mutation {
    /// Whether the self-check passed.
    pub fn verified(&self) -> bool {
        match *self {
            Mutation::Inverted { verified, .. } | Mutation::Swapped { verified, .. } => verified,
        }
    }
}

/// Per-worker tally returned after join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Pool slot
    pub slot: usize,
    /// Behavior run by this worker
    pub role: WorkerRole,
    /// Critical sections completed
    pub operations: u64,
    /// Mismatches this worker observed
    pub corruptions: u64,
}

/// One pool slot.
#[derive(Debug, Clone, Copy)]
pub struct Worker {
    slot: usize,
    role: WorkerRole,
    positions: Uniform<usize>,
}

impl Worker {
    /// Worker for `slot` over a buffer of `len` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `len` is 0.
    pub fn new(slot: usize, len: usize) -> Self {
        Self {
            slot,
            role: WorkerRole::for_slot(slot),
            positions: Uniform::new(0, len),
        }
    }

    /// Slot index.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Assigned behavior.
    pub fn role(&self) -> WorkerRole {
        self.role
    }

    /// Thread name used when spawning.
    pub fn thread_name(&self) -> String {
        format!("stress-{}", self.slot)
    }

    /// Run one critical-section body against an already locked region.
    pub fn step<R: Rng + ?Sized>(&self, region: &mut StressRegion<'_>, rng: &mut R) -> Mutation {
        let mutation = match self.role {
            WorkerRole::Inverter => {
                let pos = self.positions.sample(rng);
                let verified = region.buffer.invert(pos);
                Mutation::Inverted { pos, verified }
            }
            WorkerRole::Swapper => {
                let first = self.positions.sample(rng);
                let second = self.positions.sample(rng);
                let verified = region.buffer.swap(first, second);
                Mutation::Swapped {
                    first,
                    second,
                    verified,
                }
            }
        };
        if !mutation.verified() {
            region.corruptions.increment();
        }
        mutation
    }

    /// Loop until `deadline`, one locked iteration at a time.
    ///
    /// The random source is private to this worker and seeded from OS
    /// entropy, so no two workers share a sequence.
    pub fn run(&self, region: &Mutex<StressRegion<'_>>, deadline: Instant) -> WorkerReport {
        let mut rng = StdRng::from_entropy();
        let mut operations = 0u64;
        let mut corruptions = 0u64;

        while Instant::now() < deadline {
            let mut guard = region.lock();
            let mutation = self.step(&mut guard, &mut rng);
            drop(guard);

            operations += 1;
            if !mutation.verified() {
                corruptions += 1;
            }
            trace!(target: "memstress::worker", slot = self.slot, ?mutation, "Mutated");
        }

        WorkerReport {
            slot: self.slot,
            role: self.role,
            operations,
            corruptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::{verify_pattern, PatternFiller};
    use std::time::Duration;

    fn filled(len: usize) -> StressBuffer {
        let mut buffer = StressBuffer::allocate(len).unwrap();
        PatternFiller::new(1).unwrap().fill(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn roles_alternate_by_slot() {
        assert_eq!(WorkerRole::for_slot(0), WorkerRole::Inverter);
        assert_eq!(WorkerRole::for_slot(1), WorkerRole::Swapper);
        assert_eq!(WorkerRole::for_slot(2), WorkerRole::Inverter);
        assert_eq!(WorkerRole::for_slot(7), WorkerRole::Swapper);
    }

    #[test]
    fn inverter_step_complements_one_byte() {
        let mut buffer = filled(32);
        let before = buffer.to_vec();
        let worker = Worker::new(0, 32);
        let mut rng = StdRng::seed_from_u64(7);
        let mut region = StressRegion::new(&mut buffer);

        let mutation = worker.step(&mut region, &mut rng);
        assert_eq!(region.corruptions.value(), 0);

        let Mutation::Inverted { pos, verified } = mutation else {
            panic!("inverter produced {:?}", mutation);
        };
        assert!(verified);
        let after = buffer.to_vec();
        assert_eq!(after[pos], !before[pos]);
        for i in (0..32).filter(|&i| i != pos) {
            assert_eq!(after[i], before[i]);
        }
    }

    #[test]
    fn self_swap_on_single_byte_buffer() {
        // A one-byte buffer forces both positions to coincide.
        let mut buffer = StressBuffer::from_vec(vec![0x55]);
        let worker = Worker::new(1, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let mut region = StressRegion::new(&mut buffer);

        let mutation = worker.step(&mut region, &mut rng);
        assert_eq!(
            mutation,
            Mutation::Swapped {
                first: 0,
                second: 0,
                verified: true
            }
        );
        assert_eq!(region.corruptions.value(), 0);
        assert_eq!(buffer.read(0), 0x55);
    }

    #[test]
    fn swapper_preserves_byte_multiset() {
        let mut buffer = filled(64);
        let worker = Worker::new(1, 64);
        let mut rng = StdRng::seed_from_u64(42);
        {
            let mut region = StressRegion::new(&mut buffer);
            for _ in 0..1000 {
                assert!(worker.step(&mut region, &mut rng).verified());
            }
        }
        let bytes = buffer.to_vec();
        assert_eq!(bytes.iter().filter(|&&b| b == 0x55).count(), 32);
        assert_eq!(bytes.iter().filter(|&&b| b == 0xAA).count(), 32);
    }

    #[test]
    fn run_past_deadline_does_nothing() {
        let mut buffer = filled(16);
        let region = Mutex::new(StressRegion::new(&mut buffer));
        let worker = Worker::new(0, 16);
        let report = worker.run(&region, Instant::now());
        assert_eq!(report.operations, 0);
        assert_eq!(report.role, WorkerRole::Inverter);
        drop(region);
        assert_eq!(verify_pattern(&buffer), 0);
    }

    #[test]
    fn run_until_deadline() {
        let mut buffer = filled(256);
        let region = Mutex::new(StressRegion::new(&mut buffer));
        let worker = Worker::new(3, 256);
        let deadline = Instant::now() + Duration::from_millis(20);
        let report = worker.run(&region, deadline);
        assert!(Instant::now() >= deadline);
        assert!(report.operations > 0);
        assert_eq!(report.corruptions, 0);
        assert_eq!(region.into_inner().corruptions.value(), 0);
    }

    #[test]
    fn thread_name_uses_slot() {
        assert_eq!(Worker::new(5, 1).thread_name(), "stress-5");
    }
}
