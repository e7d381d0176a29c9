//! Rule-based operator advisories derived from a sensor snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SensorSnapshot;

pub const PH_LOW: f64 = 6.5;
pub const PH_HIGH: f64 = 8.0;
/// Daily production target in m³
pub const PRODUCTION_TARGET: f64 = 85.0;
/// Allowed deviation from the target, in percent, before an insight fires
pub const PRODUCTION_TOLERANCE_PCT: f64 = 10.0;
pub const MAX_INSIGHTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Optimization,
    Maintenance,
    Efficiency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impact::Low => write!(f, "Low"),
            Impact::Medium => write!(f, "Medium"),
            Impact::High => write!(f, "High"),
        }
    }
}

/// An advisory message for the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    /// Percentage, 0 to 100
    pub confidence: u8,
    pub impact: Impact,
}

impl Insight {
    fn new(
        kind: InsightKind,
        title: &str,
        description: String,
        confidence: u8,
        impact: Impact,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description,
            confidence,
            impact,
        }
    }
}

/// Derive at most [`MAX_INSIGHTS`] advisories from `snapshot`.
///
/// Rules run in a fixed order (pH, anomaly, production) and the first three
/// matches are kept; rule order is the priority. When no rule matches a
/// single "System Running Optimally" insight is returned, so the list is
/// never empty. A zero `ph` or `biogas_production` counts as missing.
pub fn derive_insights(snapshot: &SensorSnapshot) -> Vec<Insight> {
    let mut insights: Vec<Insight> = [
        ph_insight(snapshot),
        anomaly_insight(snapshot),
        production_insight(snapshot),
    ]
    .into_iter()
    .flatten()
    .collect();

    if insights.is_empty() {
        insights.push(Insight::new(
            InsightKind::Efficiency,
            "System Running Optimally",
            "All parameters within expected ranges. No action needed at this time.".to_string(),
            97,
            Impact::Low,
        ));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

/// A reading that counts as present: set, non-zero and not NaN
pub(crate) fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

fn ph_insight(snapshot: &SensorSnapshot) -> Option<Insight> {
    let ph = present(snapshot.ph)?;

    let insight = if ph < PH_LOW {
        Insight::new(
            InsightKind::Optimization,
            "pH Level Low",
            format!(
                "Increase pH from {:.1} to optimal range (6.5-8.0) for better biogas production.",
                ph
            ),
            89,
            Impact::High,
        )
    } else if ph > PH_HIGH {
        Insight::new(
            InsightKind::Optimization,
            "pH Level High",
            format!(
                "Decrease pH from {:.1} to optimal range (6.5-8.0) for better biogas production.",
                ph
            ),
            91,
            Impact::High,
        )
    } else {
        Insight::new(
            InsightKind::Efficiency,
            "Optimal pH Level",
            format!(
                "Current pH ({:.1}) is within the optimal range for biogas production.",
                ph
            ),
            95,
            Impact::Low,
        )
    };
    Some(insight)
}

fn anomaly_insight(snapshot: &SensorSnapshot) -> Option<Insight> {
    if !snapshot.anomaly_detected {
        return None;
    }
    let cause = snapshot
        .anomaly_cause
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or("Unknown issue");
    Some(Insight::new(
        InsightKind::Maintenance,
        "Anomaly Detected",
        format!("{} detected. System inspection recommended.", cause),
        88,
        Impact::High,
    ))
}

/// Percentage deviation of `production` from [`PRODUCTION_TARGET`]
pub fn production_deviation_pct(production: f64) -> f64 {
    (production - PRODUCTION_TARGET) / PRODUCTION_TARGET * 100.0
}

fn production_insight(snapshot: &SensorSnapshot) -> Option<Insight> {
    let production = present(snapshot.biogas_production)?;
    let deviation = production_deviation_pct(production);

    if deviation < -PRODUCTION_TOLERANCE_PCT {
        Some(Insight::new(
            InsightKind::Optimization,
            "Production Optimization",
            format!(
                "Biogas production {:.1}m³ is below target. Consider increasing organic input by 15%.",
                production
            ),
            87,
            Impact::Medium,
        ))
    } else if deviation > PRODUCTION_TOLERANCE_PCT {
        Some(Insight::new(
            InsightKind::Efficiency,
            "Exceeding Production Targets",
            format!(
                "Biogas production at {:.1}m³ is exceeding targets. System running efficiently.",
                production
            ),
            92,
            Impact::Low,
        ))
    } else {
        None
    }
}
