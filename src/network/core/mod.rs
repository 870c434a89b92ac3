//! Device and packet-buffer types seen by hooks.

pub mod device;
pub mod packet_data;

pub use device::SxDevice;
pub use packet_data::SkBuff;
