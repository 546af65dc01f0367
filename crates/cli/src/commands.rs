//! Clap command definition.
//!
//! No flag carries a clap default: an absent flag must fall through to the
//! config file, and only then to the built-in defaults.

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the CLI command.
pub fn build_cli() -> Command {
    Command::new("memstress")
        .about("Stress memory hardware with concurrent self-verifying mutations")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("PAIRS")
                .help("Worker pairs; each pair is one inverter and one swapper (default: 4)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("perc")
                .long("perc")
                .value_name("PERCENT")
                .help("Percent of free memory + swap to allocate, 1-100 (default: 60)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("min")
                .long("min")
                .value_name("MINUTES")
                .help("Minutes to run (default: 1)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML file with pair_count, memory_percent, duration_minutes")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("available-bytes")
                .long("available-bytes")
                .value_name("BYTES")
                .help("Use this memory reading instead of querying the OS")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("allow-oversubscribe")
                .long("allow-oversubscribe")
                .help("Allow more pairs than hardware threads")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-verify")
                .long("no-verify")
                .help("Skip the pattern check between fill and stress")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More log output on stderr (repeatable)")
                .action(ArgAction::Count)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue),
        )
}
