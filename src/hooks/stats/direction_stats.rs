use crate::hooks::stats::util::ewma::Ewma;
use serde::{Deserialize, Serialize};

/// Smoothing factor for the hooks-per-pass average.
const HOOKS_PER_PASS_ALPHA: f64 = 0.05;

/// Counters for one direction's hook list.
///
/// Only ever touched while the registry lock is held, so plain integers
/// suffice.
#[derive(Debug, Clone)]
pub struct DirectionStats {
    /// Dispatch passes run, including those over an empty list
    pub passes: u64,
    /// Dispatch passes that found no hooks
    pub empty_passes: u64,
    /// Individual callback invocations
    pub invocations: u64,
    /// Successful registrations
    pub registrations: u64,
    /// Successful unregistrations
    pub unregistrations: u64,
    /// Register/unregister calls that failed after taking the lock
    pub rejected: u64,
    hooks_per_pass: Ewma,
}

impl DirectionStats {
    pub fn new() -> Self {
        Self {
            passes: 0,
            empty_passes: 0,
            invocations: 0,
            registrations: 0,
            unregistrations: 0,
            rejected: 0,
            hooks_per_pass: Ewma::new(HOOKS_PER_PASS_ALPHA),
        }
    }

    /// Records one dispatch pass that invoked `hooks` callbacks.
    #[inline]
    pub fn record_pass(&mut self, hooks: usize) {
        self.passes += 1;
        if hooks == 0 {
            self.empty_passes += 1;
        }
        self.invocations += hooks as u64;
        self.hooks_per_pass.update(hooks as f64);
    }

    /// Smoothed number of hooks run per pass, 0.0 before the first pass.
    pub fn recent_hooks_per_pass(&self) -> f64 {
        self.hooks_per_pass.get().unwrap_or(0.0)
    }

    pub fn snapshot(&self, registered: usize) -> DirectionStatsSnapshot {
        DirectionStatsSnapshot {
            registered,
            passes: self.passes,
            empty_passes: self.empty_passes,
            invocations: self.invocations,
            registrations: self.registrations,
            unregistrations: self.unregistrations,
            rejected: self.rejected,
            recent_hooks_per_pass: self.recent_hooks_per_pass(),
        }
    }

    /// Zeroes every counter and forgets the smoothed average.
    pub fn reset(&mut self) {
        self.passes = 0;
        self.empty_passes = 0;
        self.invocations = 0;
        self.registrations = 0;
        self.unregistrations = 0;
        self.rejected = 0;
        self.hooks_per_pass.reset();
    }
}

impl Default for DirectionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`DirectionStats`] plus the current list length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionStatsSnapshot {
    pub registered: usize,
    pub passes: u64,
    pub empty_passes: u64,
    pub invocations: u64,
    pub registrations: u64,
    pub unregistrations: u64,
    pub rejected: u64,
    pub recent_hooks_per_pass: f64,
}
