use clap::Parser;
use serde::{Deserialize, Serialize};

/// Hook slots reserved per direction when the registry is created.
pub const DEFAULT_HOOK_CAPACITY: usize = 8;

#[derive(Parser, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryOptions {
    /// Hooks each direction can hold before the list has to grow
    #[arg(long = "hook-capacity", id = "hook-capacity", default_value_t = DEFAULT_HOOK_CAPACITY)]
    pub capacity: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HOOK_CAPACITY,
        }
    }
}
