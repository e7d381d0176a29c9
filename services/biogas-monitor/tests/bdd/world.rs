//! BDD test world for the biogas monitor

use std::sync::Arc;

use cucumber::World;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use biogas_monitor::api::ApiClient;
use biogas_monitor::feeds::FeedSet;
use biogas_monitor::insights::Insight;
use biogas_monitor::io::{HttpClient, HttpResponse};
use biogas_monitor::model::SensorSnapshot;
use biogas_monitor::{Config, MonitorError};

/// A recorded HTTP request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
}

/// Canned backend responses, keyed by endpoint
#[derive(Debug, Clone)]
pub struct Script {
    pub sensor: Result<HttpResponse, String>,
    pub history: Result<HttpResponse, String>,
    pub status: Result<HttpResponse, String>,
    pub reset: Result<HttpResponse, String>,
    pub predict: Result<HttpResponse, String>,
}

fn ok(body: &str) -> Result<HttpResponse, String> {
    Ok(HttpResponse {
        status: 200,
        body: body.to_string(),
    })
}

impl Default for Script {
    fn default() -> Self {
        Self {
            sensor: ok(
                r#"{"ph": 7.1, "biogas_production": 85.0, "timestamp": "2024-05-01T10:00:00", "anomaly_detected": false, "anomaly_probability": 0.04, "system_status": "Normal"}"#,
            ),
            history: ok(
                r#"[{"timestamp": "2024-05-01T09:00:00", "biogas_production": 84.0, "anomaly_probability": 0.1}]"#,
            ),
            status: ok(
                r#"{"status": "Normal", "last_updated": "2024-05-01T10:00:00", "anomaly_detected": false}"#,
            ),
            reset: ok(r#"{"success": true, "message": "Alarm reset successfully"}"#),
            predict: ok(
                r#"{"prediction": {"anomaly_probability": 0.12, "cause": "Normal operation"}, "input": {"ph": 7.0, "biogas_production": 80.0}}"#,
            ),
        }
    }
}

/// An HTTP client that serves a mutable [`Script`] and records every request
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    pub script: RwLock<Script>,
    pub requests: RwLock<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    async fn respond(&self, method: &str, url: &str) -> biogas_monitor::Result<HttpResponse> {
        self.requests.write().await.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
        });

        let script = self.script.read().await;
        let canned = if url.ends_with("/sensor-data") {
            &script.sensor
        } else if url.ends_with("/historical-data") {
            &script.history
        } else if url.ends_with("/system-status") {
            &script.status
        } else if url.ends_with("/reset-alarm") {
            &script.reset
        } else if url.ends_with("/predict") {
            &script.predict
        } else {
            return Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            });
        };
        canned
            .clone()
            .map_err(|msg| MonitorError::transport(None, msg))
    }

    pub async fn count(&self, method: &str, suffix: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .count()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedBackend {
    async fn get(&self, url: &str) -> biogas_monitor::Result<HttpResponse> {
        self.respond("GET", url).await
    }

    async fn post_json(
        &self,
        url: &str,
        _body: &serde_json::Value,
    ) -> biogas_monitor::Result<HttpResponse> {
        self.respond("POST", url).await
    }
}

#[derive(Debug, Default, World)]
pub struct MonitorWorld {
    // Insight derivation
    pub snapshot: SensorSnapshot,
    pub insights: Vec<Insight>,

    // Feeds against a scripted backend
    pub backend: Option<Arc<ScriptedBackend>>,
    pub feeds: Option<Arc<FeedSet>>,
    pub api: Option<ApiClient>,
    pub refresh_result: Option<bool>,
    pub reset_result: Option<bool>,

    // Dashboard
    pub response_status: Option<u16>,
    pub response_body: Option<String>,

    // Lifecycle
    pub config: Config,
    pub cancel: Option<CancellationToken>,
    pub build_succeeded: Option<bool>,
    pub start_succeeded: Option<bool>,
}

impl MonitorWorld {
    pub fn backend(&mut self) -> Arc<ScriptedBackend> {
        self.backend
            .get_or_insert_with(|| Arc::new(ScriptedBackend::default()))
            .clone()
    }

    /// Feed set wired to the scripted backend, created on first use
    pub fn feeds(&mut self) -> Arc<FeedSet> {
        if let Some(feeds) = &self.feeds {
            return Arc::clone(feeds);
        }
        let http: Arc<dyn HttpClient> = self.backend();
        let api = ApiClient::new("http://digester.test/api", http);
        let feeds = Arc::new(FeedSet::new(&api, &self.config.polling, 10));
        self.api = Some(api);
        self.feeds = Some(Arc::clone(&feeds));
        feeds
    }

    pub fn api(&mut self) -> ApiClient {
        self.feeds();
        self.api.clone().expect("api not set")
    }
}
