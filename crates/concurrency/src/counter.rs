//! Corruption counter
//!
//! Lives inside the same mutex as the buffer, so `&mut` access already
//! implies the lock is held and a plain integer suffices.

/// Number of self-check mismatches observed during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CorruptionCounter {
    count: u64,
}

impl CorruptionCounter {
    /// Counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one corruption event.
    pub fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Events recorded so far.
    pub fn value(&self) -> u64 {
        self.count
    }
}
