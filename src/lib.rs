//! # skbhook - packet hook registry for a network driver
//!
//! skbhook lets independent components observe every buffer a network
//! device receives or transmits, without being wired into the driver.
//!
//! ## Features
//!
//! * Separate RX and TX hook lists with registration-order dispatch
//! * Duplicate and null-callback rejection with errno-style errors
//! * An interrupt-safe spin lock guarding every list operation
//! * Per-direction statistics gathered inside the existing critical sections
//! * A driver shim and synthetic traffic source for exercising the registry
//!
//! ## Quick Start
//!
//! ```rust
//! use skbhook::prelude::*;
//!
//! let registry = Arc::new(SkbHookRegistry::new());
//! let driver = SxDriver::new(SxDevice::new(0, "sx0"), Arc::clone(&registry));
//!
//! let counter = PacketCounter::new();
//! registry
//!     .register_rx(Some(count_packet), HookContext::from_ref(&counter))
//!     .unwrap();
//!
//! driver.receive(&SkBuff::new(0, Direction::Rx, vec![0; 64]));
//! registry.unregister_rx(Some(count_packet)).unwrap();
//!
//! assert_eq!(counter.packets(), 1);
//! ```

/// Command handlers behind the CLI
pub mod commands;
/// Centralized error handling
pub mod error;
/// The hook registry itself
pub mod hooks;
/// Driver shim, packet model and sample hook consumers
pub mod network;
/// Prelude for convenient imports
pub mod prelude;
/// Configuration settings
pub mod settings;
/// Shared utility functions
pub mod utils;

// Re-export commonly used types
pub use error::{HookError, Result, SkbHookError};
