use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::points::PointConfig;
use crate::ServerError;

/// The whole device configuration. Published to running tasks as an
/// immutable `Arc<DaemonConfig>` snapshot; a change replaces the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_device_instance", alias = "deviceId")]
    pub device_instance: u32,
    #[serde(default = "default_device_name", alias = "deviceName")]
    pub device_name: String,
    #[serde(default, alias = "objects")]
    pub points: Vec<PointConfig>,
    /// Kept as raw JSON so one bad entry does not reject the rest.
    #[serde(default)]
    pub trendlogs: Vec<serde_json::Value>,
    /// Overrides the sampler tick when set.
    #[serde(default)]
    pub sample_tick_ms: Option<u64>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            device_instance: default_device_instance(),
            device_name: default_device_name(),
            points: Vec::new(),
            trendlogs: Vec::new(),
            sample_tick_ms: None,
        }
    }
}

impl DaemonConfig {
    pub fn from_json(json: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

fn default_device_instance() -> u32 {
    260_001
}

fn default_device_name() -> String {
    "bactrend".to_string()
}
