// Monitoring session lifecycle
//
// One owned session object per dashboard mount: opens the stream task and the
// fallback poller, tears both down on close. Teardown is explicit, idempotent
// and order-independent; Drop closes as well.

use crate::config::MonitorConfig;
use crate::event::Channel;
use crate::poller::{FallbackPoller, HttpStatusFetcher, StatusFetcher};
use crate::sink::{AlertNotifier, LogNotifier, StateSink};
use crate::snapshot::DashboardSnapshot;
use crate::stream::{ConnectionStatus, StreamClient};
use crate::{MonitorError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

/// Handle over one logical dashboard subscription
pub struct MonitorSession {
    sink: StateSink,
    status_tx: watch::Sender<ConnectionStatus>,
    status_rx: watch::Receiver<ConnectionStatus>,
    last_event_at: Arc<RwLock<Option<Instant>>>,
    stream_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
}

impl MonitorSession {
    /// Open a session with the default (log-only) alert notifier
    pub fn open(config: MonitorConfig) -> Result<Self> {
        Self::open_with_notifier(config, Arc::new(LogNotifier))
    }

    /// Open a session routing named events to a custom notifier.
    ///
    /// Fails fast when no token is present; the client never attempts an
    /// unauthenticated connection.
    pub fn open_with_notifier(
        config: MonitorConfig,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Result<Self> {
        if config.token.is_empty() {
            return Err(MonitorError::MissingToken);
        }

        let sink = StateSink::new(notifier);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let last_event_at = Arc::new(RwLock::new(None));

        let client = StreamClient::new(
            config.clone(),
            sink.clone(),
            status_tx.clone(),
            last_event_at.clone(),
        );
        let stream_task = tokio::spawn(client.run());

        let fetcher: Arc<dyn StatusFetcher> = Arc::new(HttpStatusFetcher::new(&config));
        let poller = FallbackPoller::new(
            fetcher,
            sink.clone(),
            status_tx.clone(),
            config.poll_interval,
        );
        let poll_task = tokio::spawn(poller.run());

        info!(target: "session", url = %config.stream_url, "Monitoring session opened");

        Ok(Self {
            sink,
            status_tx,
            status_rx,
            last_event_at,
            stream_task: Some(stream_task),
            poll_task: Some(poll_task),
        })
    }

    /// Current snapshot, cloned for the reader
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.sink.snapshot().await
    }

    /// Watch receiver over the connection status
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    pub fn is_live(&self) -> bool {
        *self.status_rx.borrow() == ConnectionStatus::Live
    }

    /// Subscribe to snapshot refresh signals
    pub fn subscribe_refresh(&self) -> broadcast::Receiver<Channel> {
        self.sink.subscribe_refresh()
    }

    /// Instant of the last stream event (heartbeats included), for
    /// staleness indicators
    pub async fn last_event_at(&self) -> Option<Instant> {
        *self.last_event_at.read().await
    }

    /// Tear down the stream, any pending reconnect timer and the fallback
    /// poller. Safe to call more than once.
    pub fn close(&mut self) {
        let was_open = self.stream_task.is_some() || self.poll_task.is_some();
        if let Some(handle) = self.stream_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.poll_task.take() {
            handle.abort();
        }
        if was_open {
            let _ = self.status_tx.send(ConnectionStatus::Disconnected);
            info!(target: "session", "Monitoring session closed");
        }
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.close();
    }
}
