//! Driver-side collaborators of the hook registry.
//!
//! The device and buffer types hooks are called with, the send/receive shim
//! that dispatches to the registry, a synthetic traffic source and a few
//! demo observers.

pub mod core;
pub mod driver;
pub mod observers;
pub mod traffic;

use crate::hooks::{HookFn, HookRegistry};
use self::core::{SkBuff, SxDevice};

/// Hook registry specialised for this driver's device and buffer types.
pub type SkbHookRegistry = HookRegistry<SxDevice, SkBuff>;

/// Hook signature for [`SkbHookRegistry`].
pub type SkbHookFn = HookFn<SxDevice, SkBuff>;

pub use driver::{DriverCounters, SxDriver};
pub use traffic::TrafficGenerator;
