//! Per-direction hook statistics.
//!
//! Kept inside the registry's locked state and updated from the critical
//! sections that already exist, so collecting them adds no locking.

pub mod direction_stats;
pub mod util;

use crate::hooks::direction::Direction;
use serde::{Deserialize, Serialize};

pub use direction_stats::{DirectionStats, DirectionStatsSnapshot};

/// Statistics for both hook lists.
#[derive(Debug, Clone, Default)]
pub struct HookStatistics {
    pub rx: DirectionStats,
    pub tx: DirectionStats,
}

impl HookStatistics {
    pub fn get_mut(&mut self, direction: Direction) -> &mut DirectionStats {
        match direction {
            Direction::Rx => &mut self.rx,
            Direction::Tx => &mut self.tx,
        }
    }
}

/// Serializable copy of [`HookStatistics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookStatisticsSnapshot {
    pub rx: DirectionStatsSnapshot,
    pub tx: DirectionStatsSnapshot,
}

impl HookStatisticsSnapshot {
    pub fn get(&self, direction: Direction) -> &DirectionStatsSnapshot {
        match direction {
            Direction::Rx => &self.rx,
            Direction::Tx => &self.tx,
        }
    }
}
