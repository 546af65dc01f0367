//! Parallel pattern fill
//!
//! Writes `0x55` at even indices and `0xAA` at odd indices across the whole
//! buffer. The buffer is cut into `2 * partitions` contiguous pieces with
//! `split_at_mut`, so each fill thread owns a disjoint `&mut [u8]` and no
//! lock is taken: the borrow checker proves the write sets cannot overlap.
//!
//! [`PatternFiller::fill_reserved`] writes into fresh, uninitialized capacity
//! so a run never pays for a serial zeroing pass before the parallel one.

use crate::buffer::{store_uninit, ReservedBuffer, StressBuffer};
use memstress_core::config::MAX_PAIR_COUNT;
use memstress_core::{Error, Result};
use std::mem::MaybeUninit;
use std::ops::Range;
use std::thread;
use tracing::debug;

/// Byte written at even absolute indices.
pub const EVEN_BYTE: u8 = 0x55;
/// Byte written at odd absolute indices.
pub const ODD_BYTE: u8 = 0xAA;

/// Expected pattern byte at an absolute buffer index.
#[inline]
pub fn pattern_byte(index: usize) -> u8 {
    if index % 2 == 0 {
        EVEN_BYTE
    } else {
        ODD_BYTE
    }
}

/// Split `[0, len)` into `2 * partitions` contiguous ranges.
///
/// Every range has `len / (2 * partitions)` bytes except the last, which
/// also takes the remainder. Returns no ranges when `partitions` is 0 or
/// `2 * partitions` overflows.
pub fn partition_ranges(len: usize, partitions: usize) -> Vec<Range<usize>> {
    let count = match partitions.checked_mul(2) {
        Some(count) if count > 0 => count,
        _ => return Vec::new(),
    };
    let chunk = len / count;
    (0..count)
        .map(|i| {
            let start = i * chunk;
            let end = if i == count - 1 { len } else { start + chunk };
            start..end
        })
        .collect()
}

/// Count bytes that differ from the fill pattern.
pub fn verify_pattern(buffer: &StressBuffer) -> usize {
    (0..buffer.len())
        .filter(|&i| buffer.read(i) != pattern_byte(i))
        .count()
}

fn write_pattern(start: usize, chunk: &mut [MaybeUninit<u8>]) {
    for (offset, cell) in chunk.iter_mut().enumerate() {
        store_uninit(cell, pattern_byte(start + offset));
    }
}

/// Fills a buffer with the alternating pattern on a fixed set of threads.
#[derive(Debug, Clone, Copy)]
pub struct PatternFiller {
    partitions: usize,
}

impl PatternFiller {
    /// Create a filler; the fill runs on `2 * partitions` threads.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `partitions` is 0 or above `MAX_PAIR_COUNT`.
    pub fn new(partitions: usize) -> Result<Self> {
        if partitions == 0 || partitions > MAX_PAIR_COUNT {
            return Err(Error::invalid_config(format!(
                "fill partitions must be in 1..={}, got {}",
                MAX_PAIR_COUNT, partitions
            )));
        }
        Ok(Self { partitions })
    }

    /// Number of fill threads.
    pub fn thread_count(&self) -> usize {
        self.partitions * 2
    }

    /// Write the pattern over the whole buffer, returning once every
    /// partition thread has joined.
    ///
    /// # Errors
    ///
    /// `WorkerSpawn` if a thread cannot be started, `WorkerPanicked` if one
    /// dies. Threads already started are joined before either is returned.
    pub fn fill(&self, buffer: &mut StressBuffer) -> Result<()> {
        let bytes = buffer.as_mut_bytes();
        // SAFETY: `MaybeUninit<u8>` has the layout of `u8`, and only
        // initialized `u8` values are ever written through the cast slice.
        let cells = unsafe {
            std::slice::from_raw_parts_mut(
                bytes.as_mut_ptr().cast::<MaybeUninit<u8>>(),
                bytes.len(),
            )
        };
        self.fill_cells(cells)
    }

    /// Write the pattern into freshly reserved capacity and hand back the
    /// initialized buffer.
    ///
    /// # Errors
    ///
    /// As [`PatternFiller::fill`]. On error the reservation is released.
    pub fn fill_reserved(&self, mut reserved: ReservedBuffer) -> Result<StressBuffer> {
        self.fill_cells(reserved.spare())?;
        // SAFETY: `fill_cells` returned Ok, so every partition thread joined
        // after writing its range, and the ranges cover the whole reservation.
        Ok(unsafe { reserved.assume_init() })
    }

    fn fill_cells(&self, cells: &mut [MaybeUninit<u8>]) -> Result<()> {
        let ranges = partition_ranges(cells.len(), self.partitions);
        debug!(
            target: "memstress::fill",
            len = cells.len(),
            threads = ranges.len(),
            "Filling buffer"
        );

        let mut rest = cells;
        let mut pieces = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            pieces.push((range.start, head));
            rest = tail;
        }
        debug_assert!(rest.is_empty());

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(pieces.len());
            let mut spawn_error = None;
            for (n, (start, chunk)) in pieces.into_iter().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("fill-{}", n))
                    .spawn_scoped(s, move || write_pattern(start, chunk));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_error = Some(e);
                        break;
                    }
                }
            }

            let mut panicked = None;
            for handle in handles {
                let name = handle.thread().name().unwrap_or("fill").to_string();
                if handle.join().is_err() {
                    panicked.get_or_insert(name);
                }
            }

            if let Some(e) = spawn_error {
                return Err(Error::WorkerSpawn(e));
            }
            if let Some(name) = panicked {
                return Err(Error::WorkerPanicked { name });
            }
            Ok(())
        })
    }
}
