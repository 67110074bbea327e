use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bactrend_core::types::ObjectType;
use bactrend_trendlog::{LinkedObject, TrendLogManager};
use chrono::NaiveDateTime;
use tokio::sync::watch;

use crate::config::DaemonConfig;
use crate::points::PointTable;
use crate::ServerError;

/// Everything the device tasks share.
///
/// Lock order is points before trend logs. The ReadRange responder holds the
/// trend-log lock for a whole encode so record indexes cannot shift under it.
#[derive(Debug)]
pub struct DeviceState {
    points: Mutex<PointTable>,
    trendlogs: Mutex<TrendLogManager>,
    config: watch::Sender<Arc<DaemonConfig>>,
}

impl DeviceState {
    pub fn new(config: DaemonConfig) -> Arc<Self> {
        let (tx, _rx) = watch::channel(Arc::new(DaemonConfig::default()));
        let state = Arc::new(Self {
            points: Mutex::new(PointTable::default()),
            trendlogs: Mutex::new(TrendLogManager::new()),
            config: tx,
        });
        state.apply_config(config);
        state
    }

    /// Rebuilds points and trend logs from `config` and publishes it.
    /// Returns the number of trend logs loaded.
    pub fn apply_config(&self, config: DaemonConfig) -> usize {
        let points = PointTable::from_config(&config.points);
        let mut manager = TrendLogManager::new();
        let loaded = manager.load_entries(&config.trendlogs);
        log::info!(
            "device {} ({}): {} points, {loaded} trend logs",
            config.device_instance,
            config.device_name,
            points.len()
        );

        *self.points() = points;
        *self.trendlogs() = manager;
        self.config.send_replace(Arc::new(config));
        loaded
    }

    pub fn config(&self) -> Arc<DaemonConfig> {
        self.config.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DaemonConfig>> {
        self.config.subscribe()
    }

    pub fn points(&self) -> MutexGuard<'_, PointTable> {
        self.points.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn trendlogs(&self) -> MutexGuard<'_, TrendLogManager> {
        self.trendlogs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one round of periodic sampling. Returns records written.
    pub fn sample_periodic(&self, now: NaiveDateTime) -> usize {
        let points = self.points();
        self.trendlogs()
            .process_periodic(now, |object| points.sample(object))
    }

    /// Sets a point's present value and feeds it to change-of-value logs.
    /// Returns records written.
    pub fn write_point(
        &self,
        object_type: ObjectType,
        instance: u32,
        value: f64,
        now: NaiveDateTime,
    ) -> Result<usize, ServerError> {
        let sample = self.points().write(object_type, instance, value)?;
        let object = LinkedObject {
            object_type,
            instance,
        };
        Ok(self.trendlogs().process_cov(object, sample, now))
    }
}
