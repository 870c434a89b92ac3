//! Utility functions for reporting.
//!
//! This module contains shared helpers used by the commands.

use crate::hooks::{Direction, HookStatisticsSnapshot};
use log::info;
use std::time::Duration;

/// Events per second over `elapsed`; zero for an empty interval.
pub fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        0.0
    } else {
        count as f64 / secs
    }
}

/// Logs traffic totals for one path.
///
/// # Arguments
///
/// * `direction` - Path the totals belong to
/// * `packets` - Number of packets that went through the path
/// * `bytes` - Total size of those packets
/// * `elapsed` - Wall time the path was active
pub fn log_statistics(direction: Direction, packets: u64, bytes: u64, elapsed: Duration) {
    info!(
        "{} Packets: {}, Bytes: {} - {:.0} pkt/s, {:.2} MB/s",
        direction.as_str().to_uppercase(),
        packets,
        bytes,
        rate(packets, elapsed),
        rate(bytes, elapsed) / 1_000_000.0
    );
}

/// Logs per-direction registry activity.
pub fn log_hook_statistics(stats: &HookStatisticsSnapshot) {
    for direction in Direction::ALL {
        let s = stats.get(direction);
        info!(
            "{} Hooks: {} registered, Passes: {} ({} empty), Invocations: {}, \
             Registrations: {}, Unregistrations: {}, Rejected: {}",
            direction.as_str().to_uppercase(),
            s.registered,
            s.passes,
            s.empty_passes,
            s.invocations,
            s.registrations,
            s.unregistrations,
            s.rejected
        );
    }
}
