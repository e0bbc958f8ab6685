//! Bridge options with TOML preset support.
//!
//! Construction-time settings (coordinate scale, transform validation
//! tolerance, fault escalation, event queue sizing, simulator parameters)
//! are consolidated here. Options serialize to/from TOML so a host can keep
//! per-device presets next to its own configuration.
//!
//! The physical constants of the force model (stiffness, containment
//! multiplier, move cadence, zoom threshold) are deliberately not options.

mod events;
mod servo;
mod simulator;

use std::path::Path;

pub use events::EventOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use servo::ServoOptions;
pub use simulator::SimulatorOptions;

use crate::error::BridgeError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[servo]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// Servo loop and coordinate mapping parameters.
    pub servo: ServoOptions,
    /// Observer delivery parameters.
    pub events: EventOptions,
    /// Software device parameters.
    #[schemars(skip)]
    pub simulator: SimulatorOptions,
}

impl Options {
    /// Generate JSON Schema describing the host-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Io`] if the file cannot be read and
    /// [`BridgeError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = std::fs::read_to_string(path).map_err(BridgeError::Io)?;
        toml::from_str(&content)
            .map_err(|e| BridgeError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::OptionsParse`] on serialization failure and
    /// [`BridgeError::Io`] if the file or its parent directory cannot be
    /// written.
    pub fn save(&self, path: &Path) -> Result<(), BridgeError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BridgeError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(BridgeError::Io)?;
        }
        std::fs::write(path, content).map_err(BridgeError::Io)
    }

    /// Names of the presets (`<name>.toml` files) in `dir`, sorted. An
    /// unreadable or missing directory has no presets.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|path| {
                path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
            })
            .collect();
        names.sort();
        names
    }

    /// Load the preset `name` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::OptionsParse`] naming the available presets if
    /// `dir` has no such preset, otherwise whatever [`load`](Self::load)
    /// reports.
    pub fn load_preset(dir: &Path, name: &str) -> Result<Self, BridgeError> {
        let presets = Self::list_presets(dir);
        if !presets.iter().any(|preset| preset == name) {
            return Err(BridgeError::OptionsParse(format!(
                "no preset '{name}' in {} (available: {})",
                dir.display(),
                presets.join(", ")
            )));
        }
        Self::load(&dir.join(format!("{name}.toml")))
    }
}
