use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Servo", inline)]
#[serde(default)]
/// Servo loop and coordinate mapping parameters.
pub struct ServoOptions {
    /// Device units per application unit. Fixed for the bridge's lifetime.
    #[schemars(title = "Scale Factor", range(min = 0.1, max = 100.0), extend("step" = 0.1))]
    pub scale_factor: f64,
    /// Maximum deviation of `forward * inverse` from identity accepted by
    /// `set_transform`.
    #[schemars(skip)]
    pub transform_tolerance: f64,
    /// Consecutive transient driver errors tolerated before the servo loop
    /// treats the device as faulted.
    #[schemars(title = "Transient Error Limit", range(min = 0, max = 1000))]
    pub max_consecutive_transient_errors: u32,
}

impl Default for ServoOptions {
    fn default() -> Self {
        Self {
            scale_factor: 10.0,
            transform_tolerance: 1e-6,
            max_consecutive_transient_errors: 8,
        }
    }
}
