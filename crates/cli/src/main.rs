//! memstress CLI: allocate, fill, and stress a share of system memory.
//!
//! Exit codes:
//! - `0`: run completed (the corruption count is in the report)
//! - `1`: configuration, memory query, allocation, or thread failure

mod commands;
mod format;

use std::path::PathBuf;
use std::process;

use clap::ArgMatches;
use memstress_core::{Error, FixedMemory, MemoryInfoProvider, Result, RunConfig, SystemMemory};
use memstress_engine::{RunOptions, Runner};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_banner, format_report, ConsoleObserver};

fn main() {
    let matches = build_cli().get_matches();
    init_logging(&matches);

    debug!("memstress v{} starting", env!("CARGO_PKG_VERSION"));

    let exit_code = match run(&matches) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn init_logging(matches: &ArgMatches) {
    let level = if matches.get_flag("quiet") {
        "error"
    } else {
        match matches.get_count("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    // RUST_LOG wins over -v/-q when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memstress={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    let options = RunOptions {
        enforce_hardware_limit: !matches.get_flag("allow-oversubscribe"),
        verify_fill: !matches.get_flag("no-verify"),
    };
    let provider: Box<dyn MemoryInfoProvider> = match matches.get_one::<u64>("available-bytes") {
        Some(&bytes) => Box::new(FixedMemory(bytes)),
        None => Box::new(SystemMemory::detect()?),
    };

    let runner = Runner::with_options(config, provider, options);
    let plan = runner.prepare()?;
    println!("{}", format_banner(&plan));

    let report = runner.execute(plan, &mut ConsoleObserver)?;
    println!("{}", format_report(&report));
    Ok(())
}

/// Defaults, then the config file, then explicit flags.
fn resolve_config(matches: &ArgMatches) -> Result<RunConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(&pairs) = matches.get_one::<u64>("threads") {
        config.pair_count = usize::try_from(pairs)
            .map_err(|_| Error::invalid_config(format!("pair count {} is too large", pairs)))?;
    }
    if let Some(&percent) = matches.get_one::<u64>("perc") {
        config.memory_percent = u8::try_from(percent).map_err(|_| {
            Error::invalid_config(format!(
                "memory percent must be in 1..=100, got {}",
                percent
            ))
        })?;
    }
    if let Some(&minutes) = matches.get_one::<u64>("min") {
        config.duration_minutes = minutes;
    }

    config.validate()?;
    Ok(config)
}
