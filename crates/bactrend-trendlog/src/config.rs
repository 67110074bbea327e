use bactrend_core::types::ObjectType;
use serde::{Deserialize, Serialize};

pub const MAX_TREND_LOGS: usize = 50;
pub const DEFAULT_BUFFER_SIZE: u32 = 2016;
pub const MAX_BUFFER_SIZE: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    #[default]
    #[serde(alias = "periodic")]
    Periodic,
    #[serde(alias = "cov")]
    Cov,
    /// Only explicit `record_value` calls append records.
    #[serde(alias = "triggered")]
    Triggered,
}

/// The point a trend log samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkedObject {
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub instance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLogConfig {
    pub instance: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled")]
    pub enable: bool,
    /// Seconds between periodic samples.
    #[serde(default = "default_log_interval", alias = "logInterval")]
    pub log_interval: u32,
    #[serde(default = "default_buffer_size", alias = "bufferSize")]
    pub buffer_size: u32,
    #[serde(default, alias = "triggerType")]
    pub trigger_type: TriggerType,
    #[serde(default = "default_cov_increment")]
    pub cov_increment: f64,
    #[serde(default)]
    pub stop_when_full: bool,
    /// Place periodic samples on multiples of the interval since midnight.
    #[serde(default = "enabled")]
    pub align_intervals: bool,
    #[serde(default, alias = "linkedObject")]
    pub linked_object: Option<LinkedObject>,
}

impl TrendLogConfig {
    pub fn new(instance: u32, name: impl Into<String>) -> Self {
        Self {
            instance,
            name: name.into(),
            description: String::new(),
            enable: true,
            log_interval: default_log_interval(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            trigger_type: TriggerType::Periodic,
            cov_increment: default_cov_increment(),
            stop_when_full: false,
            align_intervals: true,
            linked_object: None,
        }
    }
}

fn enabled() -> bool {
    true
}

fn default_log_interval() -> u32 {
    300
}

fn default_buffer_size() -> u32 {
    DEFAULT_BUFFER_SIZE
}

fn default_cov_increment() -> f64 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::{LinkedObject, TrendLogConfig, TriggerType, DEFAULT_BUFFER_SIZE};
    use bactrend_core::types::ObjectType;

    #[test]
    fn minimal_entry_takes_defaults() {
        let cfg: TrendLogConfig =
            serde_json::from_str(r#"{"instance": 3, "name": "Supply temp"}"#).unwrap();
        assert_eq!(cfg, TrendLogConfig::new(3, "Supply temp"));
        assert_eq!(cfg.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(cfg.align_intervals);
    }

    #[test]
    fn full_entry_parses() {
        let cfg: TrendLogConfig = serde_json::from_str(
            r#"{
                "instance": 1,
                "name": "Room",
                "description": "room temperature",
                "enable": false,
                "log_interval": 60,
                "buffer_size": 100,
                "trigger_type": "COV",
                "cov_increment": 0.2,
                "stop_when_full": true,
                "align_intervals": false,
                "linked_object": {"type": "ANALOG_VALUE", "instance": 4}
            }"#,
        )
        .unwrap();
        assert!(!cfg.enable);
        assert_eq!(cfg.trigger_type, TriggerType::Cov);
        assert_eq!(
            cfg.linked_object,
            Some(LinkedObject {
                object_type: ObjectType::AnalogValue,
                instance: 4
            })
        );
    }

    #[test]
    fn camel_case_keys_are_accepted() {
        let cfg: TrendLogConfig = serde_json::from_str(
            r#"{"instance": 2, "name": "x", "logInterval": 30, "bufferSize": 50,
                "triggerType": "periodic",
                "linkedObject": {"type": "binary-input", "instance": 1}}"#,
        )
        .unwrap();
        assert_eq!(cfg.log_interval, 30);
        assert_eq!(cfg.buffer_size, 50);
        assert_eq!(cfg.trigger_type, TriggerType::Periodic);
        assert_eq!(cfg.linked_object.unwrap().object_type, ObjectType::BinaryInput);
    }

    #[test]
    fn unknown_trigger_is_an_error() {
        let err = serde_json::from_str::<TrendLogConfig>(
            r#"{"instance": 1, "name": "x", "trigger_type": "SOMETIMES"}"#,
        );
        assert!(err.is_err());
    }
}
