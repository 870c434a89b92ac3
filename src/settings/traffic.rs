use clap::Parser;
use serde::{Deserialize, Serialize};

/// Smallest Ethernet frame without FCS.
pub const DEFAULT_MIN_SIZE: usize = 60;
/// Largest standard Ethernet frame.
pub const DEFAULT_MAX_SIZE: usize = 1518;
pub const DEFAULT_PACKETS: u64 = 100_000;

#[derive(Parser, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrafficOptions {
    /// Total packets to push through the driver (0 = until interrupted)
    #[arg(long = "packets", id = "packets", default_value_t = DEFAULT_PACKETS)]
    pub packets: u64,

    /// Smallest generated frame in bytes
    #[arg(long = "min-size", id = "min-size", default_value_t = DEFAULT_MIN_SIZE)]
    pub min_size: usize,

    /// Largest generated frame in bytes
    #[arg(long = "max-size", id = "max-size", default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: usize,

    /// Fraction of packets sent down the receive path, 0.0 to 1.0
    #[arg(long = "rx-share", id = "rx-share", default_value_t = 0.5)]
    pub rx_share: f64,

    /// Packets per second per direction (0 = as fast as possible)
    #[arg(long = "pps", id = "pps", default_value_t = 0)]
    pub pps: u64,

    /// Seed for reproducible traffic
    #[arg(long = "seed", id = "seed")]
    pub seed: Option<u64>,
}

impl TrafficOptions {
    /// Splits `packets` into (rx, tx) counts according to `rx_share`.
    pub fn split(&self) -> (u64, u64) {
        let rx = (self.packets as f64 * self.rx_share).round() as u64;
        let rx = rx.min(self.packets);
        (rx, self.packets - rx)
    }
}

impl Default for TrafficOptions {
    fn default() -> Self {
        Self {
            packets: DEFAULT_PACKETS,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            rx_share: 0.5,
            pps: 0,
            seed: None,
        }
    }
}
