//! Status items, health headline and chart points derived from feed data

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::insights::{present, PH_HIGH, PH_LOW};
use crate::model::{HistoricalEntry, SensorSnapshot, Timestamp};

/// Probability above which a history entry is drawn as an anomaly
pub const ANOMALY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Normal,
    Warning,
    Error,
}

/// One labelled reading in the status panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    pub name: String,
    pub value: String,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub healthy: bool,
    pub headline: String,
    pub detail: String,
}

impl HealthSummary {
    /// The reset action is only offered while the system is unhealthy
    pub fn offers_reset(&self) -> bool {
        !self.healthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: String,
    pub biogas: f64,
    pub anomaly: f64,
}

fn item(name: &str, value: String, level: Level) -> StatusItem {
    StatusItem {
        name: name.to_string(),
        value,
        level,
    }
}

pub fn status_items(snapshot: &SensorSnapshot) -> Vec<StatusItem> {
    // a zero reading is still shown, but never rates as a normal pH
    let ph_level = match present(snapshot.ph) {
        Some(v) if (PH_LOW..=PH_HIGH).contains(&v) => Level::Normal,
        _ => Level::Warning,
    };
    let production = snapshot
        .biogas_production
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "N/A".to_string());
    let system_status = if snapshot.system_status.is_empty() {
        "Unknown".to_string()
    } else {
        snapshot.system_status.clone()
    };
    let system_level = if snapshot.system_status == "Normal" {
        Level::Normal
    } else {
        Level::Warning
    };
    let (anomaly, anomaly_level) = if snapshot.anomaly_detected {
        ("Detected", Level::Error)
    } else {
        ("None", Level::Normal)
    };

    vec![
        item(
            "pH Level",
            snapshot
                .ph
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "N/A".to_string()),
            ph_level,
        ),
        item(
            "Biogas Production",
            format!("{} m³", production),
            Level::Normal,
        ),
        item("System Status", system_status, system_level),
        item("Anomaly Detection", anomaly.to_string(), anomaly_level),
    ]
}

pub fn health_summary(snapshot: Option<&SensorSnapshot>) -> HealthSummary {
    match snapshot {
        Some(s) if !s.anomaly_detected => HealthSummary {
            healthy: true,
            headline: "System Healthy".to_string(),
            detail: "All systems functioning normally".to_string(),
        },
        _ => {
            let cause = snapshot
                .and_then(|s| s.anomaly_cause.as_deref())
                .filter(|c| !c.is_empty())
                .unwrap_or("Unknown issue");
            HealthSummary {
                healthy: false,
                headline: "System Warning".to_string(),
                detail: format!("Issue detected: {}", cause),
            }
        }
    }
}

/// Map history entries to chart points, keeping their order
pub fn chart_points(series: &[HistoricalEntry]) -> Vec<ChartPoint> {
    series
        .iter()
        .map(|entry| ChartPoint {
            time: clock_time(&entry.timestamp),
            biogas: entry.biogas_production,
            anomaly: if entry.anomaly_probability > ANOMALY_THRESHOLD {
                entry.biogas_production
            } else {
                0.0
            },
        })
        .collect()
}

/// `HH:MM` for parseable timestamps, the raw value otherwise
fn clock_time(timestamp: &Timestamp) -> String {
    match timestamp {
        Timestamp::Epoch(ms) => DateTime::from_timestamp_millis(*ms as i64)
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| timestamp.to_string()),
        Timestamp::Text(text) => {
            if let Ok(t) = DateTime::parse_from_rfc3339(text) {
                return t.format("%H:%M").to_string();
            }
            if let Ok(t) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
                return t.format("%H:%M").to_string();
            }
            text.clone()
        }
    }
}
