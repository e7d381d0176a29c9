//! Periodic-refresh state holder with an explicit start/stop lifecycle

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Tri-state view of one piece of server-derived state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub consecutive_errors: u32,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            consecutive_errors: 0,
        }
    }
}

/// How often a poller re-fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Every(Duration),
    Once,
}

/// Where a poller gets its data from
#[async_trait]
pub trait Source<T>: Send + Sync {
    async fn fetch(&self) -> crate::Result<T>;
}

/// Callback run after every successful fetch has been applied
#[async_trait]
pub trait Observer<T>: Send + Sync {
    async fn on_update(&self, value: &T);
}

struct Inner<T> {
    name: String,
    source: Arc<dyn Source<T>>,
    observers: Vec<Arc<dyn Observer<T>>>,
    state: RwLock<PollState<T>>,
    // one fetch cycle at a time, whether it came from the timer or from refresh()
    in_flight: Mutex<()>,
    fetches: AtomicU64,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Keeps one `PollState<T>` fresh by fetching from a [`Source`] on a [`Cadence`].
///
/// Nothing happens until [`Poller::start`]; [`Poller::stop`] cancels the
/// timer and waits for the task to exit. A fetch still in flight when the
/// poller is stopped is dropped and its result never reaches the state.
/// Failures keep the previous `data` and only set `error`.
pub struct Poller<T> {
    inner: Arc<Inner<T>>,
    cadence: Cadence,
    running: Mutex<Option<Running>>,
}

impl<T> std::fmt::Debug for Poller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("name", &self.inner.name)
            .field("cadence", &self.cadence)
            .finish()
    }
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, source: Arc<dyn Source<T>>, cadence: Cadence) -> Self {
        Self::with_observers(name, source, cadence, Vec::new())
    }

    pub fn with_observers(
        name: impl Into<String>,
        source: Arc<dyn Source<T>>,
        cadence: Cadence,
        observers: Vec<Arc<dyn Observer<T>>>,
    ) -> Self {
        let name = name.into();
        tracing::debug!("Created poller '{}' ({:?})", name, cadence);
        Self {
            inner: Arc::new(Inner {
                name,
                source,
                observers,
                state: RwLock::new(PollState::default()),
                in_flight: Mutex::new(()),
                fetches: AtomicU64::new(0),
            }),
            cadence,
            running: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Fetch immediately, then keep fetching on the cadence. No-op if already running.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("Poller '{}' already running", self.inner.name);
            return;
        }

        // loading is visible from the moment start() returns
        self.inner.state.write().await.loading = true;

        let cancel = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let cadence = self.cadence;
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            poll_loop(inner, cadence, task_cancel).await;
        });

        tracing::info!("Poller '{}' started", self.inner.name);
        *running = Some(Running { cancel, handle });
    }

    /// Stop the timer and wait for the polling task to exit. No-op if not running.
    pub async fn stop(&self) {
        let Some(Running { cancel, handle }) = self.running.lock().await.take() else {
            return;
        };
        cancel.cancel();
        if let Err(e) = handle.await {
            tracing::warn!("Poller '{}' task ended abnormally: {}", self.inner.name, e);
        }
        // an abandoned fetch never resolves, so nothing else will clear the flag
        self.inner.state.write().await.loading = false;
        tracing::info!("Poller '{}' stopped", self.inner.name);
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Run one fetch outside the cadence. Returns whether it succeeded.
    pub async fn refresh(&self) -> bool {
        self.inner.cycle().await
    }

    pub async fn state(&self) -> PollState<T> {
        self.inner.state.read().await.clone()
    }

    /// Number of fetch attempts issued so far
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Record a failure that happened outside a fetch cycle; `data` is untouched
    pub async fn record_error(&self, message: impl Into<String>) {
        let mut state = self.inner.state.write().await;
        state.error = Some(message.into());
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut() {
            running.cancel.cancel();
        }
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn cycle(&self) -> bool {
        let _guard = self.in_flight.lock().await;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.state.write().await.loading = true;

        tracing::debug!("Polling '{}'", self.name);
        match self.source.fetch().await {
            Ok(value) => {
                {
                    let mut state = self.state.write().await;
                    state.data = Some(value.clone());
                    state.error = None;
                    state.loading = false;
                    state.consecutive_errors = 0;
                }
                for observer in &self.observers {
                    observer.on_update(&value).await;
                }
                true
            }
            Err(e) => {
                let errors = {
                    let mut state = self.state.write().await;
                    state.error = Some(e.to_string());
                    state.loading = false;
                    state.consecutive_errors += 1;
                    state.consecutive_errors
                };
                tracing::debug!("Poll '{}' failed: {}", self.name, e);
                if errors == 5 {
                    tracing::warn!("Poller '{}' has {} consecutive errors", self.name, errors);
                }
                false
            }
        }
    }
}

async fn poll_loop<T>(inner: Arc<Inner<T>>, cadence: Cadence, cancel: CancellationToken)
where
    T: Clone + Send + Sync + 'static,
{
    let mut ticker = match cadence {
        Cadence::Every(period) => {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(ticker)
        }
        Cadence::Once => None,
    };

    loop {
        if let Some(ticker) = ticker.as_mut() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = inner.cycle() => {}
        }

        if ticker.is_none() {
            tracing::debug!("Poller '{}' fetched once, not repolling", inner.name);
            break;
        }
    }

    tracing::debug!("Polling loop for '{}' exited", inner.name);
}
