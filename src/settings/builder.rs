//! Fluent construction of [`Settings`].
//!
//! # Example
//!
//! ```rust
//! use skbhook::settings::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new()
//!     .packets(10_000)
//!     .packet_size(64, 512)
//!     .seed(7)
//!     .without_histogram()
//!     .build();
//! assert_eq!(settings.traffic.max_size, 512);
//! ```

use crate::error::Result;
use crate::settings::Settings;

/// Builder for constructing `Settings`.
///
/// Provides a fluent API for configuring a simulated driver run.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of hook slots reserved per direction up front.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Hooks each list holds before it first has to grow
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.settings.registry.capacity = capacity;
        self
    }

    /// Sets the total number of packets to generate.
    ///
    /// # Arguments
    ///
    /// * `packets` - Packets across both paths (0 = until interrupted)
    pub fn packets(mut self, packets: u64) -> Self {
        self.settings.traffic.packets = packets;
        self
    }

    /// Sets the frame size range.
    ///
    /// # Arguments
    ///
    /// * `min_size` - Smallest frame in bytes
    /// * `max_size` - Largest frame in bytes (inclusive)
    pub fn packet_size(mut self, min_size: usize, max_size: usize) -> Self {
        self.settings.traffic.min_size = min_size;
        self.settings.traffic.max_size = max_size;
        self
    }

    /// Sets how traffic is split between the two paths.
    ///
    /// # Arguments
    ///
    /// * `share` - Fraction of packets on the receive path (0.0 to 1.0)
    pub fn rx_share(mut self, share: f64) -> Self {
        self.settings.traffic.rx_share = share;
        self
    }

    /// Paces each path to a fixed packet rate.
    ///
    /// # Arguments
    ///
    /// * `pps` - Packets per second per direction (0 = unpaced)
    pub fn pps(mut self, pps: u64) -> Self {
        self.settings.traffic.pps = pps;
        self
    }

    /// Makes generated traffic reproducible.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed for the traffic generators
    pub fn seed(mut self, seed: u64) -> Self {
        self.settings.traffic.seed = Some(seed);
        self
    }

    /// Leaves the packet counter hooks unregistered.
    pub fn without_counter(mut self) -> Self {
        self.settings.observers.counter = false;
        self
    }

    /// Leaves the frame size histogram hooks unregistered.
    pub fn without_histogram(mut self) -> Self {
        self.settings.observers.histogram = false;
        self
    }

    /// Enables the churn worker.
    ///
    /// # Arguments
    ///
    /// * `interval_us` - Pause between register/unregister calls in
    ///   microseconds (0 = none)
    pub fn churn(mut self, interval_us: u64) -> Self {
        self.settings.observers.churn = true;
        self.settings.observers.churn_interval_us = interval_us;
        self
    }

    /// Sets the log level.
    ///
    /// # Arguments
    ///
    /// * `level` - One of off, error, warn, info, debug or trace
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.settings.log_level = level.into();
        self
    }

    /// Builds and returns the configured `Settings`.
    pub fn build(self) -> Settings {
        self.settings
    }

    /// Builds the settings and validates them.
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - If the settings describe a runnable configuration
    /// * `Err(SkbHookError::InvalidSettings)` - Naming the first bad field
    pub fn try_build(self) -> Result<Settings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
