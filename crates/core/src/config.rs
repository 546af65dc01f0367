//! Run configuration via `memstress.toml` or command-line flags
//!
//! A `RunConfig` is resolved once at startup (defaults, then an optional
//! config file, then flag overrides) and validated before any memory is
//! touched. Nothing mutates it afterwards.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of inverter/swapper worker pairs.
pub const DEFAULT_PAIR_COUNT: usize = 4;
/// Default share of available memory to stress, in percent.
pub const DEFAULT_MEMORY_PERCENT: u8 = 60;
/// Default run length in minutes.
pub const DEFAULT_DURATION_MINUTES: u64 = 1;
/// Largest accepted pair count; far above any real core count.
pub const MAX_PAIR_COUNT: usize = 4096;
/// Longest accepted run: one year.
pub const MAX_DURATION_MINUTES: u64 = 365 * 24 * 60;

/// Resolved parameters for a single stress run.
///
/// # Example
///
/// ```toml
/// pair_count = 4
/// memory_percent = 60
/// duration_minutes = 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Worker pairs; the pool runs `2 * pair_count` threads.
    #[serde(default = "default_pair_count")]
    pub pair_count: usize,
    /// Percentage of available memory to allocate, `1..=100`.
    #[serde(default = "default_memory_percent")]
    pub memory_percent: u8,
    /// Wall-clock length of the stress phase, at least one minute.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u64,
}

fn default_pair_count() -> usize {
    DEFAULT_PAIR_COUNT
}

fn default_memory_percent() -> u8 {
    DEFAULT_MEMORY_PERCENT
}

fn default_duration_minutes() -> u64 {
    DEFAULT_DURATION_MINUTES
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pair_count: DEFAULT_PAIR_COUNT,
            memory_percent: DEFAULT_MEMORY_PERCENT,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }
}

impl RunConfig {
    /// Create and validate a config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any field is out of range.
    pub fn new(pair_count: usize, memory_percent: u8, duration_minutes: u64) -> Result<Self> {
        let config = Self {
            pair_count,
            memory_percent,
            duration_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.pair_count == 0 || self.pair_count > MAX_PAIR_COUNT {
            return Err(Error::invalid_config(format!(
                "pair count must be in 1..={}, got {}",
                MAX_PAIR_COUNT, self.pair_count
            )));
        }
        if self.memory_percent == 0 || self.memory_percent > 100 {
            return Err(Error::invalid_config(format!(
                "memory percent must be in 1..=100, got {}",
                self.memory_percent
            )));
        }
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(Error::invalid_config(format!(
                "duration must be in 1..={} minutes, got {}",
                MAX_DURATION_MINUTES, self.duration_minutes
            )));
        }
        Ok(())
    }

    /// Reject pair counts above the detected hardware concurrency.
    pub fn check_hardware(&self, hardware_threads: usize) -> Result<()> {
        if self.pair_count > hardware_threads {
            return Err(Error::invalid_config(format!(
                "pair count {} exceeds hardware concurrency {}",
                self.pair_count, hardware_threads
            )));
        }
        Ok(())
    }

    /// Total worker threads the stress pool will spawn.
    pub fn worker_count(&self) -> usize {
        self.pair_count.saturating_mul(2)
    }

    /// Stress phase length.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_minutes.saturating_mul(60))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# memstress run configuration
#
# Worker pairs: each pair is one bit-inverter and one swapper thread.
pair_count = 4

# Share of free RAM + swap to allocate, 1..=100.
memory_percent = 60

# Length of the stress phase in minutes (at least 1).
duration_minutes = 1
"#
    }

    /// Read, parse, and validate config from a TOML file.
    ///
    /// Missing keys fall back to defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::invalid_config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
