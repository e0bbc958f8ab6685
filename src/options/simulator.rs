use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Simulator", inline)]
#[serde(default)]
/// Parameters for the software device and thread scheduler.
pub struct SimulatorOptions {
    /// Servo rate of the thread scheduler in ticks per second.
    #[schemars(title = "Servo Rate", range(min = 60, max = 4000))]
    pub rate_hz: u32,
    /// Nominal maximum continuous force reported by the simulated device.
    #[schemars(title = "Max Force", range(min = 0.1, max = 20.0), extend("step" = 0.1))]
    pub max_continuous_force: f64,
    /// Radius of the simulated stylus sweep, in device units.
    #[schemars(skip)]
    pub workspace_radius: f64,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            rate_hz: 1000,
            max_continuous_force: 3.3,
            workspace_radius: 80.0,
        }
    }
}
