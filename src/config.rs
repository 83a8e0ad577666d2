use anyhow::{Context, Result};
use serde::Deserialize;

use crate::schedule::VehicleType;

/// Lateness threshold used when nothing else is configured (6 minutes).
pub const DEFAULT_SLOW_THRESHOLD_SECONDS: i32 = 6 * 60;

/// Settings the classifier is constructed with.
///
/// Stored as a JSON object on disk, with every field optional:
/// ```json
/// {
///   "relevant_vehicle_type": "rail",
///   "slow_threshold_seconds": 360
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Only trips of this category are classified.
    pub relevant_vehicle_type: VehicleType,
    /// A stop-time delay strictly above this many seconds is reported as slow.
    pub slow_threshold_seconds: i32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            relevant_vehicle_type: VehicleType::Rail,
            slow_threshold_seconds: DEFAULT_SLOW_THRESHOLD_SECONDS,
        }
    }
}

impl ClassifierConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read classifier config '{path}'"))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid classifier config '{path}'"))
    }

    /// Applies command-line overrides on top of this config.
    pub fn with_overrides(
        mut self,
        vehicle_type: Option<VehicleType>,
        slow_threshold_seconds: Option<i32>,
    ) -> Self {
        if let Some(vehicle_type) = vehicle_type {
            self.relevant_vehicle_type = vehicle_type;
        }
        if let Some(threshold) = slow_threshold_seconds {
            self.slow_threshold_seconds = threshold;
        }
        self
    }
}
