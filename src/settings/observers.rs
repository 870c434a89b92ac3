use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ObserverOptions {
    /// Register the packet/byte counter on both paths
    #[arg(long = "no-counter", id = "no-counter", action = ArgAction::SetFalse)]
    pub counter: bool,

    /// Register the frame size histogram on both paths
    #[arg(long = "no-histogram", id = "no-histogram", action = ArgAction::SetFalse)]
    pub histogram: bool,

    /// Keep registering and unregistering a probe hook while traffic runs
    #[arg(long = "churn", id = "churn")]
    pub churn: bool,

    /// Pause between churn operations in microseconds
    #[arg(long = "churn-interval-us", id = "churn-interval-us", default_value_t = 200)]
    pub churn_interval_us: u64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            counter: true,
            histogram: true,
            churn: false,
            churn_interval_us: 200,
        }
    }
}
