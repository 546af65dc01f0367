//! Core types for memstress
//!
//! This crate defines the pieces every other crate shares:
//! - Error: Error type hierarchy
//! - RunConfig: Validated run parameters, loadable from `memstress.toml`
//! - MemoryInfoProvider: "Available memory" reading, OS-backed or fixed
//! - Sizing: Percentage-of-available buffer size arithmetic

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod memory;
pub mod sizing;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use memory::{FixedMemory, MemoryInfoProvider, ProcessMemory, SystemMemory};
pub use sizing::{buffer_len, size_for};
