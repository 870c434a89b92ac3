use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Packet path a hook is attached to.
///
/// Each direction owns an independent hook list; the same callback may be
/// registered on both at once as two distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Receive path (device -> stack)
    Rx,
    /// Transmit path (stack -> device)
    Tx,
}

impl Direction {
    /// Both directions, in RX, TX order.
    pub const ALL: [Direction; 2] = [Direction::Rx, Direction::Tx];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Rx => "rx",
            Direction::Tx => "tx",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
