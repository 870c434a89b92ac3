//! Prelude module for convenient imports.
//!
//! ```rust
//! use skbhook::prelude::*;
//! ```

pub use std::sync::Arc;

// Error handling
pub use crate::error::{HookError, Result, SkbHookError};

// Registry
pub use crate::hooks::{
    Direction, HookContext, HookFn, HookId, HookRegistry, HookStatisticsSnapshot,
    InterruptControl, IrqSpinLock, NoInterrupts,
};

// Driver side
pub use crate::network::core::{SkBuff, SxDevice};
pub use crate::network::observers::{
    count_packet, histogram_packet, PacketCounter, SizeHistogram,
};
pub use crate::network::{SkbHookFn, SkbHookRegistry, SxDriver, TrafficGenerator};

// Settings
pub use crate::settings::{Settings, SettingsBuilder};
