//! Driver integration shim.
//!
//! Sits on the device's send/receive path and calls the hook registry once
//! per buffer. The registry is injected at construction, so the same one
//! can be shared with every component that registers hooks.

use crate::hooks::Direction;
use crate::network::core::{SkBuff, SxDevice};
use crate::network::SkbHookRegistry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Packet and byte counters for one direction.
#[derive(Debug, Default)]
struct PathCounters {
    packets: AtomicU64,
    bytes: AtomicU64,
}

impl PathCounters {
    fn record(&self, len: usize) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(len as u64, Ordering::Relaxed);
    }
}

/// Snapshot of the driver's traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverCounters {
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub tx_bytes: u64,
}

/// A device's packet path with hook dispatch wired in.
#[derive(Debug)]
pub struct SxDriver {
    device: SxDevice,
    hooks: Arc<SkbHookRegistry>,
    rx: PathCounters,
    tx: PathCounters,
}

impl SxDriver {
    /// Creates a driver for `device`.
    ///
    /// # Arguments
    ///
    /// * `device` - Device handle passed to every hook
    /// * `hooks` - Registry shared with the components that register hooks
    pub fn new(device: SxDevice, hooks: Arc<SkbHookRegistry>) -> Self {
        Self {
            device,
            hooks,
            rx: PathCounters::default(),
            tx: PathCounters::default(),
        }
    }

    pub fn device(&self) -> &SxDevice {
        &self.device
    }

    /// The registry this driver dispatches to.
    pub fn hooks(&self) -> &Arc<SkbHookRegistry> {
        &self.hooks
    }

    /// Receive path: lets every RX hook observe `skb` before it is handed up.
    ///
    /// # Arguments
    ///
    /// * `skb` - Buffer just taken off the receive queue
    pub fn receive(&self, skb: &SkBuff) {
        self.rx.record(skb.len());
        self.hooks.dispatch_rx(&self.device, skb);
    }

    /// Transmit path: lets every TX hook observe `skb` before it goes out.
    ///
    /// # Arguments
    ///
    /// * `skb` - Buffer about to be placed on the transmit queue
    pub fn transmit(&self, skb: &SkBuff) {
        self.tx.record(skb.len());
        self.hooks.dispatch_tx(&self.device, skb);
    }

    /// Routes `skb` to the path named by its direction.
    pub fn handle(&self, skb: &SkBuff) {
        match skb.direction {
            Direction::Rx => self.receive(skb),
            Direction::Tx => self.transmit(skb),
        }
    }

    /// Snapshot of the per-path traffic counters.
    ///
    /// # Returns
    ///
    /// Packets and bytes seen on each path so far, whether or not any hook
    /// was registered.
    pub fn counters(&self) -> DriverCounters {
        DriverCounters {
            rx_packets: self.rx.packets.load(Ordering::Relaxed),
            rx_bytes: self.rx.bytes.load(Ordering::Relaxed),
            tx_packets: self.tx.packets.load(Ordering::Relaxed),
            tx_bytes: self.tx.bytes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookContext;
    use crate::network::observers::{count_packet, PacketCounter};

    fn driver() -> SxDriver {
        SxDriver::new(SxDevice::new(0, "sx0"), Arc::new(SkbHookRegistry::new()))
    }

    #[test]
    fn test_receive_dispatches_rx_only() {
        let driver = driver();
        let rx_counter = PacketCounter::new();
        driver
            .hooks()
            .register_rx(Some(count_packet), HookContext::from_ref(&rx_counter))
            .unwrap();

        driver.receive(&SkBuff::new(0, Direction::Rx, vec![0; 64]));
        driver.transmit(&SkBuff::new(0, Direction::Tx, vec![0; 128]));

        assert_eq!(rx_counter.packets(), 1);
        assert_eq!(rx_counter.bytes(), 64);
        driver.hooks().unregister_rx(Some(count_packet)).unwrap();
    }

    #[test]
    fn test_handle_routes_by_direction() {
        let driver = driver();
        let tx_counter = PacketCounter::new();
        driver
            .hooks()
            .register_tx(Some(count_packet), HookContext::from_ref(&tx_counter))
            .unwrap();

        driver.handle(&SkBuff::new(0, Direction::Tx, vec![0; 10]));
        driver.handle(&SkBuff::new(1, Direction::Tx, vec![0; 20]));
        driver.handle(&SkBuff::new(0, Direction::Rx, vec![0; 30]));

        assert_eq!(tx_counter.packets(), 2);
        assert_eq!(
            driver.counters(),
            DriverCounters {
                rx_packets: 1,
                rx_bytes: 30,
                tx_packets: 2,
                tx_bytes: 30,
            }
        );
        driver.hooks().unregister_tx(Some(count_packet)).unwrap();
    }

    #[test]
    fn test_no_hooks_still_counts() {
        let driver = driver();
        driver.receive(&SkBuff::new(0, Direction::Rx, vec![1, 2, 3]));

        assert_eq!(driver.counters().rx_packets, 1);
        assert_eq!(driver.hooks().statistics().rx.empty_passes, 1);
    }
}
