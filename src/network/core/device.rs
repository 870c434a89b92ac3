use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle for the network device whose traffic is being hooked.
///
/// Hooks receive it by reference on every call; it is never mutated by
/// the hook path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SxDevice {
    /// Device index
    pub id: u32,
    /// Interface name
    pub name: String,
}

impl SxDevice {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for SxDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let dev = SxDevice::new(2, "sx0");
        assert_eq!(dev.to_string(), "sx0#2");
    }
}
