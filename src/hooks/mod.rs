//! Packet hook registry.
//!
//! Lets other parts of the system observe every buffer a device receives
//! (RX) or transmits (TX) without wiring them into the driver. Consumers
//! [`register`](HookRegistry::register) a callback plus an opaque context
//! for a direction; the driver calls [`dispatch`](HookRegistry::dispatch)
//! once per buffer and every hook on that direction runs in registration
//! order.
//!
//! ```rust
//! use skbhook::hooks::{Direction, HookContext, HookRegistry};
//!
//! fn on_packet(dev: &u32, buf: &Vec<u8>, _ctx: HookContext) {
//!     assert_eq!((*dev, buf.len()), (0, 3));
//! }
//!
//! let registry: HookRegistry<u32, Vec<u8>> = HookRegistry::new();
//! registry.register(Direction::Rx, Some(on_packet), HookContext::NONE).unwrap();
//! registry.dispatch(Direction::Rx, &0, &vec![1, 2, 3]);
//! registry.unregister(Direction::Rx, Some(on_packet)).unwrap();
//! ```

pub mod direction;
pub mod entry;
pub mod list;
pub mod lock;
pub mod registry;
pub mod stats;

pub use direction::Direction;
pub use entry::{HookContext, HookEntry, HookFn, HookId};
pub use list::HookList;
pub use lock::{InterruptControl, IrqSpinGuard, IrqSpinLock, NoInterrupts};
pub use registry::HookRegistry;
pub use stats::{DirectionStatsSnapshot, HookStatisticsSnapshot};
