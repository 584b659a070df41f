// Fallback poller
//
// Guarantees the dashboard does not go stale indefinitely when the stream is
// unavailable. Ticks on a fixed interval; a tick is a no-op while the stream
// is live, otherwise it refreshes the machine status list.

use crate::config::MonitorConfig;
use crate::sink::StateSink;
use crate::snapshot::MachineStatus;
use crate::stream::ConnectionStatus;
use crate::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// One-shot machine status fetch, mockable for tests
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_machine_status(&self) -> Result<Vec<MachineStatus>>;
}

/// Production fetcher against the REST status endpoint
pub struct HttpStatusFetcher {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl HttpStatusFetcher {
    pub fn new(config: &MonitorConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            url: config.status_url.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch_machine_status(&self) -> Result<Vec<MachineStatus>> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MonitorError::Unauthorized(status.to_string()));
        }
        if !status.is_success() {
            return Err(MonitorError::PollError(format!(
                "status endpoint returned {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

/// Interval-driven refresh loop, cancelled with the session
pub struct FallbackPoller {
    fetcher: Arc<dyn StatusFetcher>,
    sink: StateSink,
    status_tx: watch::Sender<ConnectionStatus>,
    status_rx: watch::Receiver<ConnectionStatus>,
    interval: Duration,
}

impl FallbackPoller {
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        sink: StateSink,
        status_tx: watch::Sender<ConnectionStatus>,
        interval: Duration,
    ) -> Self {
        let status_rx = status_tx.subscribe();
        Self {
            fetcher,
            sink,
            status_tx,
            status_rx,
            interval,
        }
    }

    /// Task entry point. Runs regardless of stream state; the gating happens
    /// per tick. Stops for good once the session is unauthenticated.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; the stream gets the first shot
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !self.tick().await {
                return;
            }
        }
    }

    /// One poll decision: no-op while the stream is live, otherwise refresh
    /// the machine list. Transient failures are logged and retried next
    /// tick; an auth failure is terminal and returns `false` to stop the
    /// loop.
    pub async fn tick(&self) -> bool {
        match *self.status_rx.borrow() {
            ConnectionStatus::Live => {
                debug!(target: "poller", "Stream live, skipping poll");
                return true;
            }
            ConnectionStatus::Unauthorized => {
                debug!(target: "poller", "Session unauthenticated, poll loop stopped");
                return false;
            }
            _ => {}
        }

        match self.fetcher.fetch_machine_status().await {
            Ok(machines) => {
                info!(
                    target: "poller",
                    count = machines.len(),
                    "Refreshed machine status via polling"
                );
                self.sink.replace_machines(machines).await;
                true
            }
            Err(e) if e.is_fatal() => {
                warn!(target: "poller", error = %e, "Session unauthenticated, giving up polling");
                let _ = self.status_tx.send(ConnectionStatus::Unauthorized);
                false
            }
            Err(e) => {
                warn!(target: "poller", error = %e, "Machine status poll failed");
                true
            }
        }
    }
}
