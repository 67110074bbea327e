//! The set of trend logs hosted by a device.
//!
//! [`TrendLogManager`] owns every trend log, decides when each one samples
//! (periodically, on change of value, or only on demand), and serves as the
//! [`LogRepository`] behind ReadRange.

use std::fs::File;
use std::path::Path;

use bactrend_core::services::log_record::{LogDatum, LogRecord};
use bactrend_core::types::{LogStatus, StatusFlags};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::buffer::TrendLogBuffer;
use crate::clock::to_bacnet;
use crate::config::{
    LinkedObject, TrendLogConfig, TriggerType, MAX_BUFFER_SIZE, MAX_TREND_LOGS,
};
use crate::error::TrendLogError;
use crate::export::write_csv;
use crate::repository::{LogRepository, LogView};

/// A value read from a linked object, ready to be logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub datum: LogDatum,
    pub status_flags: StatusFlags,
}

impl Sample {
    pub const fn new(datum: LogDatum) -> Self {
        Self {
            datum,
            status_flags: StatusFlags::empty(),
        }
    }

    pub const fn with_flags(datum: LogDatum, status_flags: StatusFlags) -> Self {
        Self {
            datum,
            status_flags,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendLog {
    config: TrendLogConfig,
    buffer: TrendLogBuffer,
    running: bool,
    last_value: Option<f64>,
    last_logged: Option<NaiveDateTime>,
    next_due: Option<NaiveDateTime>,
}

impl TrendLog {
    fn new(config: TrendLogConfig) -> Self {
        Self {
            buffer: TrendLogBuffer::new(config.buffer_size as usize),
            running: config.enable,
            config,
            last_value: None,
            last_logged: None,
            next_due: None,
        }
    }

    pub fn config(&self) -> &TrendLogConfig {
        &self.config
    }

    pub fn instance(&self) -> u32 {
        self.config.instance
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn buffer(&self) -> &TrendLogBuffer {
        &self.buffer
    }

    pub fn last_logged(&self) -> Option<NaiveDateTime> {
        self.last_logged
    }

    fn append(&mut self, record: LogRecord) -> bool {
        if self.config.stop_when_full && self.buffer.is_full() {
            log::debug!("trend log {} is full, sample dropped", self.config.instance);
            return false;
        }
        self.buffer.push(record);
        true
    }

    fn log_sample(&mut self, sample: Sample, now: NaiveDateTime) -> bool {
        if !self.running {
            log::debug!("trend log {} is stopped, sample dropped", self.config.instance);
            return false;
        }
        let record = LogRecord::new(to_bacnet(now), sample.datum, sample.status_flags);
        if !self.append(record) {
            return false;
        }
        if let Some(value) = sample.datum.as_f64() {
            self.last_value = Some(value);
        }
        self.last_logged = Some(now);
        true
    }

    fn cov_exceeded(&self, sample: &Sample) -> bool {
        match (self.last_value, sample.datum.as_f64()) {
            (Some(previous), Some(value)) => {
                (value - previous).abs() >= self.config.cov_increment
            }
            _ => true,
        }
    }

    fn interval(&self) -> Duration {
        Duration::seconds(i64::from(self.config.log_interval.max(1)))
    }
}

impl LogView for TrendLog {
    fn record_count(&self) -> u32 {
        self.buffer.len() as u32
    }

    fn total_record_count(&self) -> u32 {
        self.buffer.total_record_count()
    }

    fn record(&self, index: u32) -> Option<LogRecord> {
        self.buffer.get(index as usize).copied()
    }
}

/// Start of the first interval boundary, counted from midnight, that is at or
/// after `now` (or strictly after it when `strict`).
fn aligned_boundary(now: NaiveDateTime, interval: Duration, strict: bool) -> NaiveDateTime {
    let midnight = now.date().and_time(NaiveTime::MIN);
    let step = interval.num_seconds();
    let elapsed = (now - midnight).num_seconds();
    let mut boundary = midnight + Duration::seconds(elapsed / step * step);
    if boundary < now || (strict && boundary == now) {
        boundary += interval;
    }
    boundary
}

/// Summary row for status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLogStatus {
    pub instance: u32,
    pub name: String,
    pub enabled: bool,
    pub record_count: u32,
    pub total_record_count: u32,
    pub buffer_size: u32,
    pub log_interval_seconds: u32,
    pub trigger_type: TriggerType,
    pub linked_object: Option<LinkedObject>,
}

#[derive(Debug, Default)]
pub struct TrendLogManager {
    logs: Vec<TrendLog>,
}

impl TrendLogManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, config: TrendLogConfig) -> Result<(), TrendLogError> {
        if self.logs.len() >= MAX_TREND_LOGS {
            return Err(TrendLogError::TooManyLogs {
                max: MAX_TREND_LOGS,
            });
        }
        if config.buffer_size == 0 || config.buffer_size > MAX_BUFFER_SIZE {
            return Err(TrendLogError::BufferSize {
                size: config.buffer_size,
                max: MAX_BUFFER_SIZE,
            });
        }
        if self.get(config.instance).is_some() {
            return Err(TrendLogError::DuplicateInstance(config.instance));
        }
        log::info!(
            "trend log {} added: {} (buffer {}, interval {}s, {:?})",
            config.instance,
            config.name,
            config.buffer_size,
            config.log_interval,
            config.trigger_type
        );
        self.logs.push(TrendLog::new(config));
        Ok(())
    }

    /// Adds every entry of a `{"trendlogs": [...]}` document. Entries that do
    /// not parse or are refused are logged and skipped. Returns how many were
    /// added.
    pub fn load_config(&mut self, json: &str) -> Result<usize, TrendLogError> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let entries = root
            .get("trendlogs")
            .and_then(serde_json::Value::as_array)
            .ok_or(TrendLogError::MissingTrendLogs)?;
        Ok(self.load_entries(entries))
    }

    pub fn load_entries(&mut self, entries: &[serde_json::Value]) -> usize {
        let mut added = 0;
        for entry in entries {
            let config = match TrendLogConfig::deserialize(entry) {
                Ok(config) => config,
                Err(err) => {
                    log::error!("skipping trend log entry: {err}");
                    continue;
                }
            };
            let instance = config.instance;
            match self.add(config) {
                Ok(()) => added += 1,
                Err(err) => log::error!("trend log {instance} not added: {err}"),
            }
        }
        added
    }

    pub fn remove(&mut self, instance: u32) -> Result<TrendLog, TrendLogError> {
        let pos = self
            .logs
            .iter()
            .position(|log| log.instance() == instance)
            .ok_or(TrendLogError::UnknownInstance(instance))?;
        log::info!("trend log {instance} removed");
        Ok(self.logs.remove(pos))
    }

    pub fn clear_all(&mut self) {
        self.logs.clear();
        log::info!("all trend logs cleared");
    }

    pub fn get(&self, instance: u32) -> Option<&TrendLog> {
        self.logs.iter().find(|log| log.instance() == instance)
    }

    fn get_mut(&mut self, instance: u32) -> Result<&mut TrendLog, TrendLogError> {
        self.logs
            .iter_mut()
            .find(|log| log.instance() == instance)
            .ok_or(TrendLogError::UnknownInstance(instance))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrendLog> {
        self.logs.iter()
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Starts or stops logging. Each transition is itself logged as a
    /// log-status record.
    pub fn set_enable(
        &mut self,
        instance: u32,
        enable: bool,
        now: NaiveDateTime,
    ) -> Result<(), TrendLogError> {
        let log = self.get_mut(instance)?;
        if log.running == enable {
            return Ok(());
        }
        log.running = enable;
        log.next_due = None;
        let status = if enable {
            LogStatus::empty()
        } else {
            LogStatus::LOG_DISABLED
        };
        log.append(LogRecord::new(
            to_bacnet(now),
            LogDatum::LogStatus(status),
            StatusFlags::empty(),
        ));
        log::info!(
            "trend log {instance} {}",
            if enable { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    pub fn clear_buffer(&mut self, instance: u32) -> Result<(), TrendLogError> {
        let log = self.get_mut(instance)?;
        log.buffer.clear();
        log.last_value = None;
        log.last_logged = None;
        log.next_due = None;
        log::info!("trend log {instance} buffer cleared");
        Ok(())
    }

    /// Appends a sample unconditionally, subject only to the log running and
    /// stop-when-full. Returns whether a record was written.
    pub fn record_value(
        &mut self,
        instance: u32,
        sample: Sample,
        now: NaiveDateTime,
    ) -> Result<bool, TrendLogError> {
        Ok(self.get_mut(instance)?.log_sample(sample, now))
    }

    /// Samples every running periodic log whose interval has come due.
    /// `read` returns the linked object's current value, or `None` if the
    /// point is unavailable. Returns the number of records written.
    pub fn process_periodic<F>(&mut self, now: NaiveDateTime, mut read: F) -> usize
    where
        F: FnMut(LinkedObject) -> Option<Sample>,
    {
        let mut written = 0;
        for log in &mut self.logs {
            if !log.running || log.config.trigger_type != TriggerType::Periodic {
                continue;
            }
            let Some(object) = log.config.linked_object else {
                continue;
            };
            let interval = log.interval();
            let align = log.config.align_intervals;
            let due = *log.next_due.get_or_insert_with(|| {
                if align {
                    aligned_boundary(now, interval, false)
                } else {
                    now
                }
            });
            if now < due {
                continue;
            }
            match read(object) {
                Some(sample) => {
                    if log.log_sample(sample, now) {
                        written += 1;
                    }
                }
                None => log::warn!(
                    "trend log {}: linked object {:?} {} unavailable",
                    log.config.instance,
                    object.object_type,
                    object.instance
                ),
            }
            log.next_due = Some(if align {
                aligned_boundary(now, interval, true)
            } else {
                now + interval
            });
        }
        written
    }

    /// Feeds a new value of `object` to the change-of-value logs linked to
    /// it. The first sample is always logged, later ones only when they move
    /// by at least the log's COV increment. Returns the number of records
    /// written.
    pub fn process_cov(&mut self, object: LinkedObject, sample: Sample, now: NaiveDateTime) -> usize {
        let mut written = 0;
        for log in &mut self.logs {
            if !log.running
                || log.config.trigger_type != TriggerType::Cov
                || log.config.linked_object != Some(object)
            {
                continue;
            }
            if log.cov_exceeded(&sample) && log.log_sample(sample, now) {
                written += 1;
            }
        }
        written
    }

    pub fn find_by_object(&self, object: LinkedObject) -> impl Iterator<Item = &TrendLog> {
        self.logs
            .iter()
            .filter(move |log| log.config.linked_object == Some(object))
    }

    pub fn status(&self) -> Vec<TrendLogStatus> {
        self.logs
            .iter()
            .map(|log| TrendLogStatus {
                instance: log.config.instance,
                name: log.config.name.clone(),
                enabled: log.running,
                record_count: log.record_count(),
                total_record_count: log.buffer.total_record_count(),
                buffer_size: log.config.buffer_size,
                log_interval_seconds: log.config.log_interval,
                trigger_type: log.config.trigger_type,
                linked_object: log.config.linked_object,
            })
            .collect()
    }

    /// Writes a log's records to `path` as CSV. Returns the row count.
    pub fn export_csv(&self, instance: u32, path: &Path) -> Result<usize, TrendLogError> {
        let log = self
            .get(instance)
            .ok_or(TrendLogError::UnknownInstance(instance))?;
        let file = File::create(path)?;
        let rows = write_csv(file, log.buffer.iter())?;
        log::info!("trend log {instance}: {rows} records exported to {}", path.display());
        Ok(rows)
    }
}

impl LogRepository for TrendLogManager {
    type Log = TrendLog;

    fn get(&self, instance: u32) -> Option<&TrendLog> {
        TrendLogManager::get(self, instance)
    }
}
