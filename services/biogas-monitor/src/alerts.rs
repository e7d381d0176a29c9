//! Bounded log of anomaly alarms raised and cleared on the status feed

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::model::SystemStatus;
use crate::poller::Observer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Raised,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub cause: String,
    pub timestamp_epoch_ms: u64,
}

#[derive(Debug)]
struct Inner {
    last_anomaly: Option<bool>,
    records: VecDeque<AlertRecord>,
}

/// Remembers the last seen anomaly flag and records transitions
#[derive(Debug)]
pub struct AlertLog {
    inner: RwLock<Inner>,
    max_size: usize,
}

impl AlertLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                last_anomaly: None,
                records: VecDeque::with_capacity(max_size),
            }),
            max_size,
        }
    }

    /// Feed one status reading; returns the alert it produced, if any
    pub async fn observe(&self, status: &SystemStatus, now_ms: u64) -> Option<AlertRecord> {
        let mut inner = self.inner.write().await;
        let previous = inner.last_anomaly.replace(status.anomaly_detected);

        let kind = match (previous.unwrap_or(false), status.anomaly_detected) {
            (false, true) => AlertKind::Raised,
            (true, false) => AlertKind::Cleared,
            _ => return None,
        };

        let cause = if status.anomaly_cause.is_empty() {
            "Unknown issue".to_string()
        } else {
            status.anomaly_cause.clone()
        };
        let record = AlertRecord {
            kind,
            cause,
            timestamp_epoch_ms: now_ms,
        };

        match kind {
            AlertKind::Raised => tracing::warn!("Anomaly alarm raised: {}", record.cause),
            AlertKind::Cleared => tracing::info!("Anomaly alarm cleared"),
        }

        if self.max_size == 0 {
            return Some(record);
        }
        if inner.records.len() >= self.max_size {
            inner.records.pop_front();
        }
        inner.records.push_back(record.clone());
        Some(record)
    }

    /// Recorded alerts, oldest first
    pub async fn records(&self) -> Vec<AlertRecord> {
        self.inner.read().await.records.iter().cloned().collect()
    }
}

#[async_trait]
impl Observer<SystemStatus> for AlertLog {
    async fn on_update(&self, value: &SystemStatus) {
        self.observe(value, current_epoch_ms()).await;
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
