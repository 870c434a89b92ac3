use crate::hooks::Direction;
use std::time::{Duration, Instant};

/// A packet buffer crossing the device.
///
/// Stands in for the driver's socket buffer: the bytes plus the metadata
/// hooks typically look at.
#[derive(Debug, Clone)]
pub struct SkBuff {
    /// Per-direction sequence number assigned by the producer
    pub seq: u64,

    /// Path the buffer is travelling
    pub direction: Direction,

    /// Raw frame contents
    pub data: Vec<u8>,

    /// Timestamp when the buffer was created
    pub arrival_time: Instant,
}

impl SkBuff {
    /// Creates a buffer stamped with the current time.
    pub fn new(seq: u64, direction: Direction, data: Vec<u8>) -> Self {
        SkBuff {
            seq,
            direction,
            data,
            arrival_time: Instant::now(),
        }
    }

    /// Returns the size of the frame in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the time elapsed since the buffer was created
    pub fn age(&self) -> Duration {
        self.arrival_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skb_creation() {
        let skb = SkBuff::new(5, Direction::Tx, vec![1, 2, 3, 4]);

        assert_eq!(skb.seq, 5);
        assert_eq!(skb.direction, Direction::Tx);
        assert_eq!(skb.len(), 4);
        assert_eq!(skb.data(), &[1, 2, 3, 4]);
        assert!(!skb.is_empty());

        // Verify that the arrival time is recent
        assert!(skb.age().as_secs() < 1);
    }
}
