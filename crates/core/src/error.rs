//! Error types for memstress
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Data corruption observed by a stress worker is deliberately absent here:
//! it is counted, not raised.

use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Result type alias for memstress operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for a stress run
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration (percent, pair count, duration, config file)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operating system could not report memory statistics
    #[error("Memory query failed: {0}")]
    PlatformQuery(String),

    /// The stress buffer could not be allocated
    #[error("Memory allocation failed for {requested} bytes: {source}")]
    Allocation {
        /// Requested buffer length in bytes
        requested: usize,
        /// Underlying reservation failure
        #[source]
        source: TryReserveError,
    },

    /// Requested buffer length does not fit the address space
    #[error("Memory allocation failed: {requested} bytes exceeds addressable memory")]
    AddressSpace {
        /// Requested buffer length in bytes
        requested: u64,
    },

    /// The OS refused to spawn a worker thread
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] io::Error),

    /// A fill or stress thread panicked
    #[error("Worker thread '{name}' panicked")]
    WorkerPanicked {
        /// Thread name of the failed worker
        name: String,
    },
}

impl Error {
    /// Build an `InvalidConfig` error from any displayable message
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Build a `PlatformQuery` error from any displayable message
    pub fn platform_query(msg: impl Into<String>) -> Self {
        Error::PlatformQuery(msg.into())
    }

    /// True for errors raised before any memory is allocated
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// True when the stress buffer could not be obtained
    pub fn is_allocation(&self) -> bool {
        matches!(self, Error::Allocation { .. } | Error::AddressSpace { .. })
    }

    /// Process exit code for this error
    ///
    /// Every failure maps to `1`; a completed run exits `0` regardless of
    /// the corruption count.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
