//! Available-memory providers
//!
//! The stress buffer is sized from a single reading: free physical memory
//! plus free swap (page file on Windows), in bytes. The OS-specific query is
//! hidden behind [`MemoryInfoProvider`]; `sysinfo` picks the backend for the
//! running platform.
//!
//! A provider never answers zero. A zero reading would size an empty buffer
//! and report an instantly successful run, so it is surfaced as
//! `PlatformQuery` instead.

use crate::error::{Error, Result};
use sysinfo::System;
use tracing::debug;

/// Source of the "available memory" reading used to size the buffer.
pub trait MemoryInfoProvider: Send + Sync {
    /// Free physical memory plus free swap, in bytes.
    ///
    /// # Errors
    ///
    /// `PlatformQuery` if the statistics cannot be obtained.
    fn available_bytes(&self) -> Result<u64>;

    /// Short label for logs and the startup banner.
    fn name(&self) -> &'static str;
}

impl<T: MemoryInfoProvider + ?Sized> MemoryInfoProvider for Box<T> {
    fn available_bytes(&self) -> Result<u64> {
        (**self).available_bytes()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Live reading from the operating system.
#[derive(Debug, Clone, Copy)]
pub struct SystemMemory {
    _private: (),
}

impl SystemMemory {
    /// Select the OS backend for this platform.
    ///
    /// # Errors
    ///
    /// `PlatformQuery` if `sysinfo` has no backend for the running OS.
    pub fn detect() -> Result<Self> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(Error::platform_query(format!(
                "memory statistics are not supported on {}",
                std::env::consts::OS
            )));
        }
        Ok(Self { _private: () })
    }
}

impl MemoryInfoProvider for SystemMemory {
    fn available_bytes(&self) -> Result<u64> {
        // Fresh handle per call; dropped before returning.
        let mut sys = System::new();
        sys.refresh_memory();
        let free_ram = sys.free_memory();
        let free_swap = sys.free_swap();

        debug!(
            target: "memstress::memory",
            free_ram,
            free_swap,
            "Queried system memory"
        );

        let total = free_ram.saturating_add(free_swap);
        if total == 0 {
            return Err(Error::platform_query(
                "operating system reported zero free memory and swap",
            ));
        }
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

/// Fixed reading, for dry runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMemory(pub u64);

impl MemoryInfoProvider for FixedMemory {
    fn available_bytes(&self) -> Result<u64> {
        if self.0 == 0 {
            return Err(Error::platform_query("fixed memory reading is zero"));
        }
        Ok(self.0)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Diagnostic view of this process's own memory footprint.
///
/// Never consulted when sizing or verifying; only logged.
pub struct ProcessMemory;

impl ProcessMemory {
    /// Virtual memory size of the current process in bytes, if the OS reports it.
    pub fn virtual_bytes() -> Option<u64> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut sys = System::new();
        if !sys.refresh_process(pid) {
            return None;
        }
        sys.process(pid).map(|p| p.virtual_memory())
    }
}
