//! Newline-delimited JSON command socket.
//!
//! Each request line is one JSON object tagged by `cmd`; each reply is one
//! JSON line. Failures come back as `{"error": "..."}` and never close the
//! connection.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bactrend_core::encoding::reader::Reader;
use bactrend_core::services::log_record::LogRecord;
use bactrend_core::services::read_range::ReadRangeAck;
use bactrend_core::services::read_range::ReadRangeRequest;
use bactrend_core::types::{ObjectId, ObjectType, PropertyId};
use bactrend_trendlog::clock::{from_bacnet, now_local};
use bactrend_trendlog::{encode_read_range, LogView, TrendLogError, TrendLogManager};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::config::DaemonConfig;
use crate::state::DeviceState;
use crate::ServerError;

pub const DEFAULT_DATA_COUNT: u32 = 10;
pub const MAX_DATA_COUNT: u32 = 100;

const DATA_BUFFER_LEN: usize = 8192;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum Command {
    Ping,
    Status,
    Trendlogs,
    Trendlog {
        instance: u32,
    },
    TrendlogData {
        instance: u32,
        /// Newest records to return. Missing or non-positive means the default.
        #[serde(default)]
        count: Option<i64>,
    },
    TrendlogEnable {
        instance: u32,
        enable: bool,
    },
    TrendlogClear {
        instance: u32,
    },
    TrendlogExport {
        instance: u32,
        path: PathBuf,
    },
    Write {
        #[serde(alias = "type")]
        object_type: ObjectType,
        instance: u32,
        value: f64,
    },
    Config {
        config: DaemonConfig,
    },
}

/// Parses and runs one request line, returning the reply document.
pub fn handle_line(state: &DeviceState, line: &str, now: NaiveDateTime) -> Value {
    let result = serde_json::from_str::<Command>(line)
        .map_err(ServerError::from)
        .and_then(|command| execute(state, command, now));
    match result {
        Ok(value) => value,
        Err(err) => {
            log::warn!("command failed: {err}");
            json!({ "error": err.to_string() })
        }
    }
}

pub fn execute(state: &DeviceState, command: Command, now: NaiveDateTime) -> Result<Value, ServerError> {
    match command {
        Command::Ping => Ok(json!({ "pong": true })),
        Command::Status => {
            let config = state.config();
            let points = state.points().counts();
            Ok(json!({
                "device_instance": config.device_instance,
                "device_name": config.device_name,
                "points": points,
                "trendlogs": state.trendlogs().len(),
            }))
        }
        Command::Trendlogs => Ok(json!({ "trendlogs": state.trendlogs().status() })),
        Command::Trendlog { instance } => {
            let logs = state.trendlogs();
            let log = logs
                .get(instance)
                .ok_or(TrendLogError::UnknownInstance(instance))?;
            let status = logs
                .status()
                .into_iter()
                .find(|status| status.instance == instance);
            Ok(json!({
                "config": log.config(),
                "status": status,
                "last_logged": log.last_logged().map(|ts| ts.to_string()),
            }))
        }
        Command::TrendlogData { instance, count } => {
            let count = match count {
                Some(n) if n > 0 => n.min(i64::from(MAX_DATA_COUNT)) as u32,
                _ => DEFAULT_DATA_COUNT,
            };
            trendlog_data(&state.trendlogs(), instance, count)
        }
        Command::TrendlogEnable { instance, enable } => {
            state.trendlogs().set_enable(instance, enable, now)?;
            Ok(json!({ "success": true, "instance": instance, "enabled": enable }))
        }
        Command::TrendlogClear { instance } => {
            state.trendlogs().clear_buffer(instance)?;
            Ok(json!({ "success": true, "instance": instance }))
        }
        Command::TrendlogExport { instance, path } => {
            let rows = state.trendlogs().export_csv(instance, &path)?;
            Ok(json!({ "success": true, "instance": instance, "rows": rows }))
        }
        Command::Write {
            object_type,
            instance,
            value,
        } => {
            let records = state.write_point(object_type, instance, value, now)?;
            Ok(json!({ "success": true, "records": records }))
        }
        Command::Config { config } => {
            let loaded = state.apply_config(config);
            Ok(json!({ "success": true, "trendlogs": loaded }))
        }
    }
}

/// Reads the newest `count` records through the ReadRange encoder, so the
/// socket sees exactly what a BACnet client would.
fn trendlog_data(logs: &TrendLogManager, instance: u32, count: u32) -> Result<Value, ServerError> {
    let log = logs
        .get(instance)
        .ok_or(TrendLogError::UnknownInstance(instance))?;
    let request = ReadRangeRequest::by_position(
        ObjectId::new(ObjectType::TrendLog, instance),
        PropertyId::LogBuffer,
        log.record_count(),
        -(count as i32),
        0,
    );

    let mut out = vec![0u8; DATA_BUFFER_LEN];
    let outcome = encode_read_range(logs, &request, &mut out)?;
    let ack = ReadRangeAck::decode_after_header(&mut Reader::new(&out[..outcome.len]))?;
    let data: Vec<Value> = ack.items.iter().map(record_json).collect();

    Ok(json!({
        "instance": instance,
        "count": count,
        "retrieved_count": ack.item_count,
        "first_sequence": ack.first_sequence_number,
        "data": data,
    }))
}

/// A log record as the command socket and the `readrange` tool print it.
/// The datum keeps its BACnet choice as `{"kind": ..., "value": ...}`.
pub fn record_json(record: &LogRecord) -> Value {
    json!({
        "timestamp": from_bacnet(record.timestamp)
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        "datum": record.datum,
        "status": record.status_flags.bits(),
    })
}

/// TCP listener for the command socket. One task per connection.
pub struct CommandServer {
    listener: TcpListener,
    state: Arc<DeviceState>,
}

impl CommandServer {
    pub async fn bind(addr: SocketAddr, state: Arc<DeviceState>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), ServerError> {
        log::info!("command socket listening on {}", self.local_addr()?);
        loop {
            let (stream, peer) = self.listener.accept().await?;
            log::debug!("command connection from {peer}");
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                if let Err(err) = serve_connection(stream, state).await {
                    log::debug!("command connection {peer} closed: {err}");
                }
            });
        }
    }
}

async fn serve_connection(stream: TcpStream, state: Arc<DeviceState>) -> Result<(), ServerError> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut reply = handle_line(&state, line, now_local()).to_string();
        reply.push('\n');
        write.write_all(reply.as_bytes()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{execute, handle_line, Command};
    use crate::config::DaemonConfig;
    use crate::state::DeviceState;
    use bactrend_core::types::ObjectType;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use serde_json::json;
    use std::sync::Arc;

    fn at(minute: u32) -> NaiveDateTime {
        let base = NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        base + Duration::minutes(i64::from(minute))
    }

    fn device() -> Arc<DeviceState> {
        DeviceState::new(
            DaemonConfig::from_json(
                r#"{
                    "device_instance": 42,
                    "device_name": "test",
                    "points": [
                        {"type": "ANALOG_VALUE", "instance": 1},
                        {"type": "BINARY_VALUE", "instance": 1}
                    ],
                    "trendlogs": [
                        {"instance": 1, "name": "av1", "trigger_type": "COV",
                         "cov_increment": 0.0,
                         "linked_object": {"type": "ANALOG_VALUE", "instance": 1}}
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    fn fill(state: &DeviceState, n: u32) {
        for i in 0..n {
            let cmd = Command::Write {
                object_type: ObjectType::AnalogValue,
                instance: 1,
                value: f64::from(i + 1),
            };
            execute(state, cmd, at(i)).unwrap();
        }
    }

    #[test]
    fn commands_parse_from_kebab_tags() {
        let cmd: Command =
            serde_json::from_str(r#"{"cmd": "trendlog-data", "instance": 3}"#).unwrap();
        assert_eq!(
            cmd,
            Command::TrendlogData {
                instance: 3,
                count: None
            }
        );
        let cmd: Command = serde_json::from_str(
            r#"{"cmd": "write", "type": "analog-value", "instance": 1, "value": 2.5}"#,
        )
        .unwrap();
        assert!(matches!(cmd, Command::Write { value, .. } if value == 2.5));
    }

    #[test]
    fn ping_and_status() {
        let state = device();
        assert_eq!(handle_line(&state, r#"{"cmd":"ping"}"#, at(0)), json!({"pong": true}));
        let status = handle_line(&state, r#"{"cmd":"status"}"#, at(0));
        assert_eq!(status["device_instance"], 42);
        assert_eq!(status["device_name"], "test");
        assert_eq!(status["points"]["ANALOG_VALUE"], 1);
        assert_eq!(status["trendlogs"], 1);
    }

    #[test]
    fn trendlog_data_returns_newest_records() {
        let state = device();
        fill(&state, 15);

        let reply = handle_line(&state, r#"{"cmd":"trendlog-data","instance":1,"count":3}"#, at(0));
        assert_eq!(reply["count"], 3);
        assert_eq!(reply["retrieved_count"], 3);
        assert_eq!(reply["first_sequence"], 13);
        let data = reply["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["datum"], json!({"kind": "real", "value": 13.0}));
        assert_eq!(data[2]["datum"]["value"], 15.0);
        assert_eq!(data[2]["timestamp"], "2025-05-06 09:14:00");
        assert_eq!(data[2]["status"], 0);
    }

    #[test]
    fn trendlog_data_count_defaults_and_caps() {
        let state = device();
        fill(&state, 120);

        let reply = handle_line(&state, r#"{"cmd":"trendlog-data","instance":1,"count":0}"#, at(0));
        assert_eq!(reply["count"], 10);
        assert_eq!(reply["retrieved_count"], 10);

        let reply =
            handle_line(&state, r#"{"cmd":"trendlog-data","instance":1,"count":500}"#, at(0));
        assert_eq!(reply["count"], 100);
        assert_eq!(reply["retrieved_count"], 100);
        assert_eq!(reply["data"][99]["datum"]["value"], 120.0);
    }

    #[test]
    fn empty_log_returns_no_data() {
        let state = device();
        let reply = handle_line(&state, r#"{"cmd":"trendlog-data","instance":1}"#, at(0));
        assert_eq!(reply["retrieved_count"], 0);
        assert_eq!(reply["first_sequence"], serde_json::Value::Null);
        assert!(reply["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn enable_and_clear() {
        let state = device();
        fill(&state, 2);

        let reply = handle_line(
            &state,
            r#"{"cmd":"trendlog-enable","instance":1,"enable":false}"#,
            at(5),
        );
        assert_eq!(reply, json!({"success": true, "instance": 1, "enabled": false}));
        let list = handle_line(&state, r#"{"cmd":"trendlogs"}"#, at(5));
        assert_eq!(list["trendlogs"][0]["enabled"], false);
        assert_eq!(list["trendlogs"][0]["record_count"], 3);
        let newest = handle_line(&state, r#"{"cmd":"trendlog-data","instance":1,"count":1}"#, at(5));
        assert_eq!(newest["data"][0]["datum"]["kind"], "log_status");

        handle_line(&state, r#"{"cmd":"trendlog-clear","instance":1}"#, at(6));
        let one = handle_line(&state, r#"{"cmd":"trendlog","instance":1}"#, at(6));
        assert_eq!(one["status"]["record_count"], 0);
        assert_eq!(one["config"]["name"], "av1");
    }

    #[test]
    fn errors_are_reported_inline() {
        let state = device();
        let reply = handle_line(&state, r#"{"cmd":"trendlog","instance":9}"#, at(0));
        assert!(reply["error"].as_str().unwrap().contains('9'));
        let reply = handle_line(&state, "not json", at(0));
        assert!(reply.get("error").is_some());
        let reply = handle_line(&state, r#"{"cmd":"reboot"}"#, at(0));
        assert!(reply.get("error").is_some());
    }

    #[test]
    fn config_command_replaces_device() {
        let state = device();
        let reply = handle_line(
            &state,
            r#"{"cmd":"config","config":{"deviceId":7,"trendlogs":[
                {"instance":4,"name":"a"},{"instance":5,"name":"b"}]}}"#,
            at(0),
        );
        assert_eq!(reply, json!({"success": true, "trendlogs": 2}));
        assert_eq!(state.config().device_instance, 7);
        assert!(state.trendlogs().get(1).is_none());
        assert!(state.trendlogs().get(5).is_some());
    }

    #[test]
    fn export_writes_csv() {
        let state = device();
        fill(&state, 2);
        let path = std::env::temp_dir().join(format!("bactrend-export-{}.csv", std::process::id()));
        let line = json!({"cmd": "trendlog-export", "instance": 1, "path": path}).to_string();
        let reply = handle_line(&state, &line, at(0));
        assert_eq!(reply["rows"], 2);
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(text.starts_with("Timestamp,Value,Status"));
        assert!(text.contains("2025-05-06 09:01:00,2.00,0"));
    }
}
