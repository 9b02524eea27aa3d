/// General functions used across the project

use std::time::Instant;

use tracing::info;

/// Peak resident set size in MB, read from /proc on Linux
pub fn peak_rss_mb() -> Option<f64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmHWM:"))?;
    let kb: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb / 1024.0)
}

/// Log elapsed wall time and peak memory
pub fn report_resources(start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    match peak_rss_mb() {
        Some(mb) => info!("[PROF] Elapsed: {:.2}s  |  Peak RSS: {:.2} MB", elapsed, mb),
        None => info!("[PROF] Elapsed: {:.2}s", elapsed),
    }
}
