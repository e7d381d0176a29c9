//! The three polling feeds: live sensor snapshot, history and system status

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::alerts::AlertLog;
use crate::api::{ApiClient, HISTORICAL_DATA_PATH, SENSOR_DATA_PATH, SYSTEM_STATUS_PATH};
use crate::config::PollingConfig;
use crate::model::{HistoricalSeries, SensorSnapshot, SystemStatus};
use crate::poller::{Cadence, Observer, PollState, Poller, Source};

pub const DEFAULT_SENSOR_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(15);

pub type SensorFeed = Poller<SensorSnapshot>;
pub type HistoryFeed = Poller<HistoricalSeries>;

/// A fixed GET path on the backend, decoded as `T`
pub struct Endpoint<T> {
    api: ApiClient,
    path: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Endpoint<T> {
    pub fn new(api: ApiClient, path: &'static str) -> Self {
        Self {
            api,
            path,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Source<T> for Endpoint<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> crate::Result<T> {
        self.api.get(self.path).await
    }
}

pub fn sensor_feed(api: &ApiClient, interval: Duration) -> SensorFeed {
    Poller::new(
        "sensor-data",
        Arc::new(Endpoint::new(api.clone(), SENSOR_DATA_PATH)),
        Cadence::Every(interval),
    )
}

/// History is fetched once unless a repoll cadence is configured
pub fn history_feed(api: &ApiClient, cadence: Cadence) -> HistoryFeed {
    Poller::new(
        "historical-data",
        Arc::new(Endpoint::new(api.clone(), HISTORICAL_DATA_PATH)),
        cadence,
    )
}

/// System status feed; the only feed that can act on the backend
#[derive(Debug)]
pub struct StatusFeed {
    poller: Poller<SystemStatus>,
    api: ApiClient,
}

impl StatusFeed {
    pub fn new(
        api: &ApiClient,
        interval: Duration,
        observers: Vec<Arc<dyn Observer<SystemStatus>>>,
    ) -> Self {
        let poller = Poller::with_observers(
            "system-status",
            Arc::new(Endpoint::new(api.clone(), SYSTEM_STATUS_PATH)),
            Cadence::Every(interval),
            observers,
        );
        Self {
            poller,
            api: api.clone(),
        }
    }

    pub fn poller(&self) -> &Poller<SystemStatus> {
        &self.poller
    }

    pub async fn start(&self) {
        self.poller.start().await;
    }

    pub async fn stop(&self) {
        self.poller.stop().await;
    }

    pub async fn state(&self) -> PollState<SystemStatus> {
        self.poller.state().await
    }

    /// Reset the alarm, then re-read status once outside the cadence.
    ///
    /// Returns false if either call failed; the error is recorded on the
    /// feed and the last good status is kept.
    pub async fn reset_alarm(&self) -> bool {
        if let Err(e) = self.api.reset_alarm().await {
            self.poller.record_error(e.to_string()).await;
            return false;
        }
        tracing::info!("Alarm reset acknowledged, refreshing system status");
        self.poller.refresh().await
    }
}

/// All three feeds plus the alert log fed by the status feed
#[derive(Debug)]
pub struct FeedSet {
    pub sensor: SensorFeed,
    pub history: HistoryFeed,
    pub status: StatusFeed,
    pub alerts: Arc<AlertLog>,
}

impl FeedSet {
    pub fn new(api: &ApiClient, polling: &PollingConfig, alert_history_size: usize) -> Self {
        let alerts = Arc::new(AlertLog::new(alert_history_size));
        let status_observer: Arc<dyn Observer<SystemStatus>> = alerts.clone();
        Self {
            sensor: sensor_feed(api, polling.sensor_interval()),
            history: history_feed(api, polling.history_cadence()),
            status: StatusFeed::new(api, polling.status_interval(), vec![status_observer]),
            alerts,
        }
    }

    pub async fn start_all(&self) {
        self.sensor.start().await;
        self.history.start().await;
        self.status.start().await;
    }

    pub async fn stop_all(&self) {
        self.sensor.stop().await;
        self.history.stop().await;
        self.status.stop().await;
    }
}
