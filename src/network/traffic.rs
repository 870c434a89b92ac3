//! Synthetic packet source used in place of real hardware queues.

use crate::hooks::Direction;
use crate::network::core::SkBuff;
use crate::settings::traffic::TrafficOptions;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces packet buffers with random sizes and payloads.
#[derive(Debug)]
pub struct TrafficGenerator {
    rng: StdRng,
    min_size: usize,
    max_size: usize,
    next_seq: u64,
}

impl TrafficGenerator {
    /// Creates a generator for frames of `min_size..=max_size` bytes.
    ///
    /// With a `seed` the sequence of sizes and payloads is reproducible.
    pub fn new(min_size: usize, max_size: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            rng,
            min_size: min_size.min(max_size),
            max_size: max_size.max(min_size),
            next_seq: 0,
        }
    }

    /// Builds a generator from traffic settings.
    ///
    /// `stream` is mixed into the seed so generators for different
    /// threads do not produce identical traffic.
    pub fn from_options(options: &TrafficOptions, stream: u64) -> Self {
        let seed = options.seed.map(|seed| seed.wrapping_add(stream));
        Self::new(options.min_size, options.max_size, seed)
    }

    /// Next buffer travelling in `direction`.
    pub fn next_packet(&mut self, direction: Direction) -> SkBuff {
        let len = self.rng.random_range(self.min_size..=self.max_size);
        let mut data = vec![0u8; len];
        self.rng.fill(&mut data[..]);

        let seq = self.next_seq;
        self.next_seq += 1;
        SkBuff::new(seq, direction, data)
    }

    /// Number of packets produced so far.
    pub fn produced(&self) -> u64 {
        self.next_seq
    }
}
