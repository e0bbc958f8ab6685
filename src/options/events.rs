use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Events", inline)]
#[serde(default)]
/// Observer delivery parameters.
pub struct EventOptions {
    /// Bounded queue length for observers registered in queued mode.
    /// Events arriving at a full queue are dropped, never waited on.
    #[schemars(title = "Queue Capacity", range(min = 1, max = 65536))]
    pub queue_capacity: usize,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
        }
    }
}
