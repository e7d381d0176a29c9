//! Biogas Monitor - facility monitoring client
//!
//! Polls the biogas backend for sensor readings, history and system status,
//! derives operator insights, and serves an operator dashboard.

pub mod alerts;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod feeds;
pub mod insights;
pub mod io;
pub mod model;
pub mod poller;

pub use config::{load_config, Config};
pub use error::{MonitorError, Result};
pub use insights::{derive_insights, Insight};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::feeds::FeedSet;
use crate::io::{HttpClient, ReqwestHttpClient};

/// Assembles a [`MonitorService`] from configuration, with optional injected parts
pub struct MonitorServiceBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    cancel: Option<CancellationToken>,
}

impl MonitorServiceBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> Result<MonitorService> {
        self.config.validate()?;

        let http: Arc<dyn HttpClient> = match (self.http, self.config.api.request_timeout_seconds)
        {
            (Some(http), _) => http,
            (None, Some(seconds)) => Arc::new(ReqwestHttpClient::with_timeout(
                Duration::from_secs(seconds),
            )?),
            (None, None) => Arc::new(ReqwestHttpClient::new()),
        };

        let api = ApiClient::new(self.config.api.base_url.clone(), http);
        let feeds = Arc::new(FeedSet::new(
            &api,
            &self.config.polling,
            self.config.dashboard.alert_history_size,
        ));

        Ok(MonitorService {
            config: self.config,
            api,
            feeds,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A built monitor, ready to start polling
pub struct MonitorService {
    config: Config,
    api: ApiClient,
    feeds: Arc<FeedSet>,
    cancel: CancellationToken,
}

impl MonitorService {
    pub fn feeds(&self) -> &Arc<FeedSet> {
        &self.feeds
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start all feeds and the dashboard; returns once cancelled and everything has stopped
    pub async fn start(self) -> Result<()> {
        self.feeds.start_all().await;

        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("Shutdown signal received"),
                        Err(e) => {
                            tracing::error!("Failed to listen for ctrl-c: {}", e);
                            return;
                        }
                    }
                    cancel_for_signal.cancel();
                }
                _ = cancel_for_signal.cancelled() => {}
            }
        });

        let dashboard = if self.config.dashboard.enabled {
            let dashboard_port = self.config.dashboard.port;
            let router = dashboard::build_router(Arc::clone(&self.feeds), self.api.clone());
            let cancel_for_dashboard = self.cancel.clone();

            Some(tokio::spawn(async move {
                let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::error!(
                            "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                            dashboard_port,
                            e
                        );
                        return;
                    }
                };
                tracing::info!("Dashboard listening on http://{}", addr);

                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel_for_dashboard.cancelled().await;
                    })
                    .await
                    .ok();

                tracing::debug!("Dashboard stopped");
            }))
        } else {
            None
        };

        tracing::info!("Biogas monitor started against {}", self.api.base_url());

        self.cancel.cancelled().await;

        self.feeds.stop_all().await;
        if let Some(handle) = dashboard {
            if let Err(e) = handle.await {
                return Err(MonitorError::Dashboard(e.to_string()));
            }
        }
        tracing::info!("Biogas monitor stopped");

        Ok(())
    }
}

/// Run the biogas monitor with the given configuration until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    MonitorServiceBuilder::new(config).build()?.start().await
}
