//! Small hook consumers used by the `run` command and tests.
//!
//! Each hook finds its state through the registration context. The state
//! is owned by whoever registered the hook and must stay alive until the
//! hook is unregistered. Everything here is lock-free so it is safe to run
//! with the registry lock held.

use crate::hooks::HookContext;
use crate::network::core::{SkBuff, SxDevice};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Packet/byte totals filled in by [`count_packet`].
#[derive(Debug, Default)]
pub struct PacketCounter {
    packets: AtomicU64,
    bytes: AtomicU64,
}

impl PacketCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&self, len: usize) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// Counts packets and bytes. Context: `&PacketCounter`.
pub fn count_packet(_dev: &SxDevice, skb: &SkBuff, ctx: HookContext) {
    // SAFETY: registered with the address of a live PacketCounter.
    if let Some(counter) = unsafe { ctx.as_ref::<PacketCounter>() } {
        counter.record(skb.len());
    }
}

/// Counts packets only. Used as a short-lived hook by the churn worker.
/// Context: `&AtomicU64`.
pub fn probe_packet(_dev: &SxDevice, _skb: &SkBuff, ctx: HookContext) {
    // SAFETY: registered with the address of a live AtomicU64.
    if let Some(hits) = unsafe { ctx.as_ref::<AtomicU64>() } {
        hits.fetch_add(1, Ordering::Relaxed);
    }
}

/// Upper bounds (inclusive) of the histogram buckets, in bytes. The last
/// bucket takes everything larger.
pub const SIZE_BUCKETS: [usize; 6] = [64, 128, 256, 512, 1024, 1518];

/// Frame size distribution filled in by [`histogram_packet`].
#[derive(Debug, Default)]
pub struct SizeHistogram {
    buckets: [AtomicU64; SIZE_BUCKETS.len() + 1],
}

impl SizeHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the bucket holding a frame of `len` bytes.
    pub fn bucket_for(len: usize) -> usize {
        SIZE_BUCKETS
            .iter()
            .position(|&limit| len <= limit)
            .unwrap_or(SIZE_BUCKETS.len())
    }

    #[inline]
    pub fn record(&self, len: usize) {
        self.buckets[Self::bucket_for(len)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SizeHistogramSnapshot {
        let counts = self
            .buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        SizeHistogramSnapshot {
            limits: SIZE_BUCKETS.to_vec(),
            counts,
        }
    }
}

/// Records each frame's size. Context: `&SizeHistogram`.
pub fn histogram_packet(_dev: &SxDevice, skb: &SkBuff, ctx: HookContext) {
    // SAFETY: registered with the address of a live SizeHistogram.
    if let Some(histogram) = unsafe { ctx.as_ref::<SizeHistogram>() } {
        histogram.record(skb.len());
    }
}

/// Serializable copy of a [`SizeHistogram`].
///
/// `counts` has one more element than `limits`; the last counts frames
/// larger than every limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeHistogramSnapshot {
    pub limits: Vec<usize>,
    pub counts: Vec<u64>,
}

impl SizeHistogramSnapshot {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Direction;

    fn skb(len: usize) -> SkBuff {
        SkBuff::new(0, Direction::Rx, vec![0; len])
    }

    #[test]
    fn test_count_packet() {
        let dev = SxDevice::new(0, "sx0");
        let counter = PacketCounter::new();
        let ctx = HookContext::from_ref(&counter);

        count_packet(&dev, &skb(100), ctx);
        count_packet(&dev, &skb(50), ctx);

        assert_eq!(counter.packets(), 2);
        assert_eq!(counter.bytes(), 150);
    }

    #[test]
    fn test_null_context_is_ignored() {
        let dev = SxDevice::new(0, "sx0");
        count_packet(&dev, &skb(100), HookContext::NONE);
        histogram_packet(&dev, &skb(100), HookContext::NONE);
        probe_packet(&dev, &skb(100), HookContext::NONE);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(SizeHistogram::bucket_for(0), 0);
        assert_eq!(SizeHistogram::bucket_for(64), 0);
        assert_eq!(SizeHistogram::bucket_for(65), 1);
        assert_eq!(SizeHistogram::bucket_for(1518), 5);
        assert_eq!(SizeHistogram::bucket_for(9000), 6);
    }

    #[test]
    fn test_histogram_packet() {
        let dev = SxDevice::new(0, "sx0");
        let histogram = SizeHistogram::new();
        let ctx = HookContext::from_ref(&histogram);

        histogram_packet(&dev, &skb(60), ctx);
        histogram_packet(&dev, &skb(1500), ctx);
        histogram_packet(&dev, &skb(4000), ctx);

        let snap = histogram.snapshot();
        assert_eq!(snap.total(), 3);
        assert_eq!(snap.counts, vec![1, 0, 0, 0, 0, 1, 1]);
        assert_eq!(snap.limits.len() + 1, snap.counts.len());
    }

    #[test]
    fn test_probe_packet() {
        let dev = SxDevice::new(0, "sx0");
        let hits = AtomicU64::new(0);
        probe_packet(&dev, &skb(1), HookContext::from_ref(&hits));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
