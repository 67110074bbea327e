use std::sync::Arc;
use std::time::Duration;

use bactrend_trendlog::clock::now_local;
use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::config::DaemonConfig;
use crate::state::DeviceState;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Drives periodic trend logs. Each tick asks the manager which logs are due;
/// the tick only bounds how late a sample can be.
pub struct Sampler {
    state: Arc<DeviceState>,
    default_tick: Duration,
}

impl Sampler {
    pub fn new(state: Arc<DeviceState>, default_tick: Duration) -> Self {
        Self {
            state,
            default_tick: default_tick.max(Duration::from_millis(1)),
        }
    }

    fn tick_for(&self, config: &DaemonConfig) -> Duration {
        config
            .sample_tick_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(self.default_tick)
    }

    fn ticker(&self, config: &DaemonConfig) -> Interval {
        let mut ticker = interval(self.tick_for(config));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Samples until `shutdown` turns true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut config_rx = self.state.subscribe();
        let mut ticker = self.ticker(&config_rx.borrow_and_update());
        log::debug!("sampler tick {:?}", ticker.period());

        loop {
            if *shutdown.borrow() {
                return;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                changed = config_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    ticker = self.ticker(&config_rx.borrow_and_update());
                    log::info!("sampler reconfigured, tick {:?}", ticker.period());
                }
                _ = ticker.tick() => {
                    let written = self.state.sample_periodic(now_local());
                    if written > 0 {
                        log::debug!("sampler wrote {written} records");
                    }
                }
            }
        }
    }
}
