//! Operator dashboard: JSON API endpoints and a server-rendered page

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::api::ApiClient;
use crate::derive::{chart_points, health_summary, status_items, Level};
use crate::feeds::FeedSet;
use crate::insights::derive_insights;
use crate::model::PredictionRequest;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub feeds: Arc<FeedSet>,
    pub api: ApiClient,
}

/// Build the dashboard axum router
pub fn build_router(feeds: Arc<FeedSet>, api: ApiClient) -> Router {
    let dashboard_state = DashboardState { feeds, api };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/sensor", get(sensor_handler))
        .route("/api/insights", get(insights_handler))
        .route("/api/status", get(status_handler))
        .route("/api/history", get(history_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/api/reset-alarm", post(reset_alarm_handler))
        .route("/api/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn level_colors(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::Normal => ("#155724", "#d4edda"),
        Level::Warning => ("#856404", "#fff3cd"),
        Level::Error => ("#721c24", "#f8d7da"),
    }
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let sensor = dashboard.feeds.sensor.state().await;
    let snapshot = sensor.data.as_ref();

    let health = health_summary(snapshot);
    let (health_color, health_bg) = if health.healthy {
        level_colors(Level::Normal)
    } else {
        level_colors(Level::Error)
    };

    let status_rows: String = snapshot
        .map(status_items)
        .unwrap_or_default()
        .iter()
        .map(|item| {
            let (color, _) = level_colors(item.level);
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem; font-weight: 600; color: {};">{}</td>
                </tr>"#,
                escape(&item.name),
                color,
                escape(&item.value)
            )
        })
        .collect();

    let insight_rows: String = snapshot
        .map(derive_insights)
        .unwrap_or_default()
        .iter()
        .map(|insight| {
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{} Impact</td>
                    <td style="padding: 0.5rem;">{}%</td>
                </tr>"#,
                escape(&insight.title),
                escape(&insight.description),
                insight.impact,
                insight.confidence
            )
        })
        .collect();

    let history = dashboard.feeds.history.state().await;
    let history_rows: String = match (&history.data, &history.error) {
        (_, Some(error)) => format!(
            r#"<tr><td colspan="3" style="padding: 0.5rem; color: #721c24;">Error loading historical data: {}</td></tr>"#,
            escape(error)
        ),
        (Some(series), None) => chart_points(series)
            .iter()
            .map(|point| {
                let color = if point.anomaly > 0.0 { "#dc3545" } else { "inherit" };
                format!(
                    r#"<tr style="border-bottom: 1px solid #dee2e6; color: {};">
                    <td style="padding: 0.5rem;">{}</td>
                    <td style="padding: 0.5rem;">{:.1} m³</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
                    color,
                    escape(&point.time),
                    point.biogas,
                    if point.anomaly > 0.0 { "Anomaly" } else { "" }
                )
            })
            .collect(),
        (None, None) => {
            r#"<tr><td colspan="3" style="padding: 0.5rem;">Loading...</td></tr>"#.to_string()
        }
    };

    let alert_rows: String = dashboard
        .feeds
        .alerts
        .records()
        .await
        .iter()
        .rev()
        .map(|alert| {
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.5rem;"><script>document.write(new Date({}).toLocaleTimeString())</script></td>
                    <td style="padding: 0.5rem;">{:?}</td>
                    <td style="padding: 0.5rem;">{}</td>
                </tr>"#,
                alert.timestamp_epoch_ms,
                alert.kind,
                escape(&alert.cause)
            )
        })
        .collect();

    let loading_note = if sensor.loading && snapshot.is_none() {
        "<p>Loading sensor data...</p>"
    } else {
        ""
    };
    let reset_button = if health.offers_reset() {
        r#"<button onclick="resetAlarm()" style="margin-top: 1rem; padding: 0.5rem 1rem; color: white; background-color: #dc3545; border: none; border-radius: 0.25rem;">Reset Alarm</button>"#
    } else {
        ""
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Biogas Monitor</title>
    <script>
        function resetAlarm() {{
            fetch('/api/reset-alarm', {{ method: 'POST' }}).then(() => location.reload());
        }}
        setInterval(() => location.reload(), 5000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Biogas Monitor</h1>
    {loading_note}
    <section style="padding: 1rem; border-radius: 0.25rem; color: {health_color}; background-color: {health_bg};">
        <h2 style="margin: 0;">{headline}</h2>
        <p style="margin: 0.25rem 0 0 0;">{detail}</p>
        {reset_button}
    </section>
    <section>
        <h2>System Status</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <tbody>{status_rows}</tbody>
        </table>
    </section>
    <section>
        <h2>Insights</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Title</th>
                    <th style="padding: 0.5rem; text-align: left;">Advice</th>
                    <th style="padding: 0.5rem; text-align: left;">Impact</th>
                    <th style="padding: 0.5rem; text-align: left;">Confidence</th>
                </tr>
            </thead>
            <tbody>{insight_rows}</tbody>
        </table>
    </section>
    <section>
        <h2>Biogas Production</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead>
                <tr style="border-bottom: 2px solid #dee2e6;">
                    <th style="padding: 0.5rem; text-align: left;">Time</th>
                    <th style="padding: 0.5rem; text-align: left;">Production</th>
                    <th style="padding: 0.5rem; text-align: left;"></th>
                </tr>
            </thead>
            <tbody>{history_rows}</tbody>
        </table>
    </section>
    <section>
        <h2>Recent Alerts</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <tbody>{alert_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
        loading_note = loading_note,
        health_color = health_color,
        health_bg = health_bg,
        headline = escape(&health.headline),
        detail = escape(&health.detail),
        reset_button = reset_button,
        status_rows = status_rows,
        insight_rows = insight_rows,
        history_rows = history_rows,
        alert_rows = alert_rows,
    );

    Html(html)
}

async fn sensor_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.feeds.sensor.state().await)
}

async fn insights_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let sensor = dashboard.feeds.sensor.state().await;
    let insights = sensor
        .data
        .as_ref()
        .map(derive_insights)
        .unwrap_or_default();
    Json(insights)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let status = dashboard.feeds.status.state().await;
    let sensor = dashboard.feeds.sensor.state().await;
    let snapshot = sensor.data.as_ref();

    Json(serde_json::json!({
        "status": status,
        "items": snapshot.map(status_items).unwrap_or_default(),
        "health": health_summary(snapshot),
    }))
}

async fn history_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let history = dashboard.feeds.history.state().await;
    let points = history
        .data
        .as_deref()
        .map(chart_points)
        .unwrap_or_default();

    Json(serde_json::json!({
        "loading": history.loading,
        "error": history.error,
        "points": points,
    }))
}

async fn alerts_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.feeds.alerts.records().await)
}

async fn reset_alarm_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let success = dashboard.feeds.status.reset_alarm().await;
    Json(serde_json::json!({ "success": success }))
}

async fn predict_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<PredictionRequest>,
) -> impl IntoResponse {
    match dashboard
        .api
        .predict(request.ph, request.biogas_production)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(serde_json::json!(response))),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
