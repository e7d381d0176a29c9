//! Transport client for the biogas backend API

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::io::{HttpClient, HttpResponse};
use crate::model::{
    HistoricalSeries, PredictionRequest, PredictionResponse, ResetAck, SensorSnapshot,
    SystemStatus,
};
use crate::MonitorError;

pub const SENSOR_DATA_PATH: &str = "/sensor-data";
pub const HISTORICAL_DATA_PATH: &str = "/historical-data";
pub const PREDICT_PATH: &str = "/predict";
pub const RESET_ALARM_PATH: &str = "/reset-alarm";
pub const SYSTEM_STATUS_PATH: &str = "/system-status";

/// Stateless client for the backend; cheap to share between feeds.
///
/// Every failure is logged at error level before it is handed back to the
/// caller. There is no retry: one failed attempt surfaces immediately.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Created ApiClient for {}", base_url);
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and parse the JSON body into `T`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let url = self.url(path);
        let result = match self.http.get(&url).await {
            Ok(response) => parse_response(&response),
            Err(e) => Err(e),
        };
        result.inspect_err(|e| tracing::error!("API GET error: {} ({})", e, url))
    }

    /// POST `body` as JSON to `path` and parse the JSON body into `T`
    pub async fn post<B, T>(&self, path: &str, body: &B) -> crate::Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let result = match serde_json::to_value(body) {
            Ok(body) => match self.http.post_json(&url, &body).await {
                Ok(response) => parse_response(&response),
                Err(e) => Err(e),
            },
            Err(e) => Err(MonitorError::Json(e)),
        };
        result.inspect_err(|e| tracing::error!("API POST error: {} ({})", e, url))
    }

    pub async fn get_sensor_data(&self) -> crate::Result<SensorSnapshot> {
        self.get(SENSOR_DATA_PATH).await
    }

    pub async fn get_historical_data(&self) -> crate::Result<HistoricalSeries> {
        self.get(HISTORICAL_DATA_PATH).await
    }

    pub async fn predict(
        &self,
        ph: f64,
        biogas_production: f64,
    ) -> crate::Result<PredictionResponse> {
        let request = PredictionRequest {
            ph,
            biogas_production,
        };
        self.post(PREDICT_PATH, &request).await
    }

    pub async fn reset_alarm(&self) -> crate::Result<ResetAck> {
        self.post(RESET_ALARM_PATH, &serde_json::json!({})).await
    }

    pub async fn get_system_status(&self) -> crate::Result<SystemStatus> {
        self.get(SYSTEM_STATUS_PATH).await
    }
}

fn parse_response<T: DeserializeOwned>(response: &HttpResponse) -> crate::Result<T> {
    if !response.is_success() {
        return Err(MonitorError::transport(
            Some(response.status),
            truncate(&response.body),
        ));
    }
    serde_json::from_str(&response.body).map_err(|e| {
        MonitorError::transport(Some(response.status), format!("Invalid JSON body: {}", e))
    })
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
