//! Configuration types for the biogas monitor

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::poller::Cadence;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// No timeout unless set; a hung request then keeps its feed loading
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: None,
        }
    }
}

/// Refresh cadence of each feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_sensor_interval")]
    pub sensor_interval_seconds: u64,
    #[serde(default = "default_status_interval")]
    pub status_interval_seconds: u64,
    /// History is fetched once when unset
    #[serde(default)]
    pub history_interval_seconds: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            sensor_interval_seconds: default_sensor_interval(),
            status_interval_seconds: default_status_interval(),
            history_interval_seconds: None,
        }
    }
}

impl PollingConfig {
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_secs(self.sensor_interval_seconds)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_seconds)
    }

    pub fn history_cadence(&self) -> Cadence {
        match self.history_interval_seconds {
            Some(seconds) => Cadence::Every(Duration::from_secs(seconds)),
            None => Cadence::Once,
        }
    }

    fn validate(&self) -> crate::Result<()> {
        let intervals = [
            ("sensor_interval_seconds", Some(self.sensor_interval_seconds)),
            ("status_interval_seconds", Some(self.status_interval_seconds)),
            ("history_interval_seconds", self.history_interval_seconds),
        ];
        for (name, value) in intervals {
            if value == Some(0) {
                return Err(crate::MonitorError::Config(format!(
                    "polling.{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_alert_history_size")]
    pub alert_history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            alert_history_size: default_alert_history_size(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(crate::MonitorError::Config(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if self.api.request_timeout_seconds == Some(0) {
            return Err(crate::MonitorError::Config(
                "api.request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        self.polling.validate()
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_sensor_interval() -> u64 {
    10
}

fn default_status_interval() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_alert_history_size() -> usize {
    100
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::MonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
