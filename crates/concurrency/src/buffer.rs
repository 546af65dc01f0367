//! The stress buffer
//!
//! An owned, contiguous byte region whose every access goes through
//! `ptr::read_volatile` / `ptr::write_volatile`. The point of the run is to
//! make the hardware actually perform each load and store, so the optimizer
//! must not fold a write followed by its verifying read into a constant.
//!
//! The allocation is released when the buffer is dropped, on every exit path.
//!
//! A run reserves capacity with [`StressBuffer::reserve`] and lets the fill
//! threads write straight into the uninitialized [`ReservedBuffer`], so the
//! pattern fill is the first and only pass that touches each page.

use memstress_core::{Error, Result};
use std::mem::MaybeUninit;
use std::ptr;

/// Volatile load of a single cell.
#[inline]
pub(crate) fn load(cell: &u8) -> u8 {
    // SAFETY: `cell` is a valid, aligned, initialized reference.
    unsafe { ptr::read_volatile(cell) }
}

/// Volatile store to a single cell.
#[inline]
pub(crate) fn store(cell: &mut u8, value: u8) {
    // SAFETY: `cell` is a valid, aligned, uniquely borrowed reference.
    unsafe { ptr::write_volatile(cell, value) }
}

/// Volatile store to a cell that may not be initialized yet.
#[inline]
pub(crate) fn store_uninit(cell: &mut MaybeUninit<u8>, value: u8) {
    // SAFETY: `cell` is valid, aligned, and uniquely borrowed; writing a
    // `u8` through it needs no prior initialization.
    unsafe { ptr::write_volatile(cell.as_mut_ptr(), value) }
}

fn reserve_exact(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|source| Error::Allocation {
            requested: len,
            source,
        })?;
    Ok(bytes)
}

/// Capacity for a stress buffer that has not been written yet.
///
/// Obtained from [`StressBuffer::reserve`] and turned into a
/// [`StressBuffer`] by [`PatternFiller::fill_reserved`](crate::PatternFiller::fill_reserved),
/// which initializes every byte. Dropping it releases the reservation.
pub struct ReservedBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl ReservedBuffer {
    /// Bytes reserved.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length reservation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn spare(&mut self) -> &mut [MaybeUninit<u8>] {
        &mut self.bytes.spare_capacity_mut()[..self.len]
    }

    /// # Safety
    ///
    /// Every cell of [`ReservedBuffer::spare`] must have been written.
    pub(crate) unsafe fn assume_init(mut self) -> StressBuffer {
        // SAFETY: capacity is at least `len` and the caller initialized
        // every byte below it.
        self.bytes.set_len(self.len);
        StressBuffer {
            bytes: self.bytes.into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for ReservedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservedBuffer")
            .field("len", &self.len)
            .finish()
    }
}

/// Owned byte region driven by the fill and stress phases.
pub struct StressBuffer {
    bytes: Box<[u8]>,
}

impl StressBuffer {
    /// Allocate `len` zeroed bytes.
    ///
    /// The reservation is fallible: when the allocator refuses, the error
    /// carries the requested size and the allocator's reason, and nothing
    /// remains allocated.
    ///
    /// # Errors
    ///
    /// `Allocation` if the memory cannot be reserved.
    pub fn allocate(len: usize) -> Result<Self> {
        let mut bytes = reserve_exact(len)?;
        bytes.resize(len, 0);
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Reserve `len` bytes without writing them.
    ///
    /// Same failure behavior as [`StressBuffer::allocate`]; the bytes become
    /// readable only once a fill has initialized them.
    ///
    /// # Errors
    ///
    /// `Allocation` if the memory cannot be reserved.
    pub fn reserve(len: usize) -> Result<ReservedBuffer> {
        Ok(ReservedBuffer {
            bytes: reserve_exact(len)?,
            len,
        })
    }

    /// Wrap existing bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Volatile read of `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn read(&self, index: usize) -> u8 {
        load(&self.bytes[index])
    }

    /// Volatile write of `value` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn write(&mut self, index: usize, value: u8) {
        store(&mut self.bytes[index], value)
    }

    /// Complement the byte at `pos`, then re-read it.
    ///
    /// Returns `true` when the re-read equals the complement of the old value.
    pub fn invert(&mut self, pos: usize) -> bool {
        let old = self.read(pos);
        self.write(pos, !old);
        self.read(pos) == !old
    }

    /// Exchange the bytes at `first` and `second`, then re-read both.
    ///
    /// `first == second` is a valid self-swap: the byte is rewritten with
    /// its own value and verifies as unchanged.
    pub fn swap(&mut self, first: usize, second: usize) -> bool {
        let a = self.read(first);
        let b = self.read(second);
        self.write(first, b);
        self.write(second, a);
        if first == second {
            return self.read(first) == a;
        }
        self.read(first) == b && self.read(second) == a
    }

    /// Copy out the current contents with volatile reads.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.iter().map(load).collect()
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl std::fmt::Debug for StressBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StressBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}
