//! Human-readable banner and report text.
//!
//! Everything here goes to stdout; logs and errors go to stderr.

use memstress_engine::{RunObserver, RunPlan, RunReport};
use std::time::Instant;

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Render a byte count with a binary unit, e.g. `1.50 GiB`.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Startup banner echoing the resolved configuration.
pub fn format_banner(plan: &RunPlan) -> String {
    format!(
        "Starting memory stress\n\
         Worker pairs: {} ({} threads)\n\
         Memory limit: {}% of {} ({} reading)\n\
         Buffer size: {}\n\
         Duration: {} min\n",
        plan.config.pair_count,
        plan.worker_count(),
        plan.config.memory_percent,
        format_bytes(plan.available_bytes),
        plan.provider,
        format_bytes(plan.buffer_len as u64),
        plan.config.duration_minutes,
    )
}

/// Final report: corruption count first, then throughput.
pub fn format_report(report: &RunReport) -> String {
    let mut out = String::new();
    if let Some(mismatches) = report.fill_mismatches {
        out.push_str(&format!("Fill check mismatches: {}\n", mismatches));
    }
    out.push_str(&format!("Corruptions detected: {}\n", report.corruptions()));
    out.push_str(&format!(
        "Operations: {} inversions, {} swaps in {:.1}s\n",
        report.inversions(),
        report.swaps(),
        report.pool.elapsed.as_secs_f64()
    ));
    if let Some(bytes) = report.process_virtual_bytes {
        out.push_str(&format!("Process virtual size: {}\n", format_bytes(bytes)));
    }
    if report.is_clean() {
        out.push_str("Stress run complete, no corruption observed.");
    } else {
        out.push_str("Stress run complete, CORRUPTION OBSERVED.");
    }
    out
}

/// Progress line printed before the fill threads start.
pub fn format_fill_start(plan: &RunPlan) -> String {
    format!(
        "Filling {} on {} threads...",
        format_bytes(plan.buffer_len as u64),
        plan.worker_count()
    )
}

/// Progress line printed once the fill has joined.
pub fn format_fill_complete(mismatches: Option<usize>) -> String {
    match mismatches {
        Some(0) => "Fill done, pattern verified.\n".to_string(),
        Some(n) => format!("Fill done, {} bytes off pattern.\n", n),
        None => "Fill done.\n".to_string(),
    }
}

/// Prints phase progress lines as the run advances.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_fill_start(&mut self, plan: &RunPlan) {
        println!("{}", format_fill_start(plan));
    }

    fn on_fill_complete(&mut self, mismatches: Option<usize>) {
        println!("{}", format_fill_complete(mismatches));
    }

    fn on_stress_start(&mut self, deadline: Instant) {
        let secs = deadline.saturating_duration_since(Instant::now()).as_secs();
        println!("Stressing for {}s...", secs);
    }
}
