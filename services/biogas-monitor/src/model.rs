//! Wire types exchanged with the biogas backend

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reading timestamp; the backend sends ISO-8601 text but epoch numbers are accepted too
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Text(String),
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::Text(String::new())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Epoch(ms) => write!(f, "{}", ms),
            Timestamp::Text(text) => write!(f, "{}", text),
        }
    }
}

/// One point-in-time reading from the sensor backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub biogas_production: Option<f64>,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub anomaly_detected: bool,
    #[serde(default)]
    pub anomaly_probability: f64,
    #[serde(default)]
    pub system_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_cause: Option<String>,
}

/// One entry of the historical series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEntry {
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub biogas_production: f64,
    #[serde(default)]
    pub anomaly_probability: f64,
}

/// Chronologically ordered history, as supplied by the backend
pub type HistoricalSeries = Vec<HistoricalEntry>;

/// Overall system status, polled independently of the sensor snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub anomaly_detected: bool,
    #[serde(default)]
    pub anomaly_cause: String,
}

/// Body of a `/predict` request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub ph: f64,
    pub biogas_production: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub anomaly_probability: f64,
    #[serde(default)]
    pub cause: String,
}

/// Result of a `/predict` request; the backend echoes the input back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub prediction: Prediction,
    #[serde(default)]
    pub input: Option<PredictionRequest>,
}

/// Acknowledgement of `/reset-alarm`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResetAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
