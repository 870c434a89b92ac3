//! Settings for the simulated driver run.
//!
//! Every option struct doubles as a set of command-line flags (clap) and a
//! TOML section (serde), so a run can be configured either way.
//!
//! # Example
//!
//! ```rust
//! use skbhook::settings::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new()
//!     .packets(1_000)
//!     .rx_share(0.75)
//!     .churn(100)
//!     .build();
//! assert!(settings.validate().is_ok());
//! ```

pub mod builder;
pub mod file;
pub mod observers;
pub mod registry;
pub mod traffic;

pub use builder::SettingsBuilder;
pub use observers::ObserverOptions;
pub use registry::RegistryOptions;
pub use traffic::TrafficOptions;

use crate::error::{Result, SkbHookError};
use clap::Parser;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Largest frame the traffic generator may produce.
pub const MAX_FRAME_SIZE: usize = 65_535;

/// All settings for one run.
#[derive(Parser, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Log level: off, error, warn, info, debug or trace
    #[arg(long = "log-level", id = "log-level", default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub registry: RegistryOptions,

    #[command(flatten)]
    pub traffic: TrafficOptions,

    #[command(flatten)]
    pub observers: ObserverOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            registry: RegistryOptions::default(),
            traffic: TrafficOptions::default(),
            observers: ObserverOptions::default(),
        }
    }
}

impl Settings {
    /// Creates a new builder with default settings.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Checks that the settings describe a runnable configuration.
    pub fn validate(&self) -> Result<()> {
        if self.registry.capacity == 0 {
            return Err(SkbHookError::invalid_setting(
                "registry.capacity",
                "must be at least 1",
            ));
        }

        let traffic = &self.traffic;
        if traffic.min_size == 0 {
            return Err(SkbHookError::invalid_setting(
                "traffic.min_size",
                "must be at least 1",
            ));
        }
        if traffic.min_size > traffic.max_size {
            return Err(SkbHookError::invalid_setting(
                "traffic.min_size",
                "must not exceed traffic.max_size",
            ));
        }
        if traffic.max_size > MAX_FRAME_SIZE {
            return Err(SkbHookError::invalid_setting(
                "traffic.max_size",
                "must not exceed 65535",
            ));
        }
        if !(0.0..=1.0).contains(&traffic.rx_share) {
            return Err(SkbHookError::invalid_setting(
                "traffic.rx_share",
                "must be within 0.0..=1.0",
            ));
        }

        self.log_level_filter()?;
        Ok(())
    }

    /// Parses `log_level` into a filter.
    pub fn log_level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| SkbHookError::invalid_setting("log_level", "unknown level"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.log_level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let mut settings = Settings::default();
        settings.traffic.min_size = 2000;
        assert!(settings.validate().is_err());

        settings.traffic.min_size = 0;
        assert!(settings.validate().is_err());

        settings.traffic.min_size = 64;
        settings.traffic.max_size = MAX_FRAME_SIZE + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_share_and_level() {
        let mut settings = Settings::default();
        settings.traffic.rx_share = 1.5;
        assert!(settings.validate().is_err());

        settings.traffic.rx_share = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.log_level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_from_flags() {
        let settings = Settings::parse_from([
            "skbhook",
            "--packets",
            "500",
            "--rx-share",
            "0.25",
            "--no-histogram",
            "--churn",
            "--hook-capacity",
            "2",
        ]);

        assert_eq!(settings.traffic.packets, 500);
        assert_eq!(settings.traffic.rx_share, 0.25);
        assert!(settings.observers.counter);
        assert!(!settings.observers.histogram);
        assert!(settings.observers.churn);
        assert_eq!(settings.registry.capacity, 2);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_flag_defaults_match_default_impl() {
        let parsed = Settings::parse_from(["skbhook"]);
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            log_level = "debug"

            [traffic]
            packets = 42
            "#,
        )
        .unwrap();

        assert_eq!(settings.traffic.packets, 42);
        assert_eq!(settings.traffic.max_size, traffic::DEFAULT_MAX_SIZE);
        assert_eq!(settings.registry, RegistryOptions::default());
        assert_eq!(settings.log_level, "debug");
    }
}
