// Event stream client
//
// Maintains a single SSE connection per session and dispatches typed events
// to the state sink. Reconnects with linear backoff up to the attempt cap,
// then leaves the session to the fallback poller.

use crate::config::MonitorConfig;
use crate::event::{Channel, SseParser};
use crate::reconnect::ReconnectPolicy;
use crate::sink::StateSink;
use crate::{MonitorError, Result};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Connection status surfaced to the UI indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Opening or waiting on a scheduled reconnect
    Connecting,
    /// Stream open, events flowing
    Live,
    /// Transport dropped; shown as "Desconectado" immediately
    Disconnected,
    /// Token missing, expired or invalid; terminal for the session
    Unauthorized,
    /// Reconnect attempts exhausted; polling-only mode
    Failed,
}

/// SSE client driving one logical subscription
pub struct StreamClient {
    http: reqwest::Client,
    config: MonitorConfig,
    sink: StateSink,
    status_tx: watch::Sender<ConnectionStatus>,
    last_event_at: Arc<RwLock<Option<Instant>>>,
}

impl StreamClient {
    pub fn new(
        config: MonitorConfig,
        sink: StateSink,
        status_tx: watch::Sender<ConnectionStatus>,
        last_event_at: Arc<RwLock<Option<Instant>>>,
    ) -> Self {
        // No overall request timeout: the stream is long-lived by design
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            config,
            sink,
            status_tx,
            last_event_at,
        }
    }

    /// Task entry point: connect, consume, reconnect until the policy gives
    /// up or a fatal auth error surfaces.
    pub async fn run(self) {
        let mut policy = ReconnectPolicy::new(
            self.config.reconnect_base_delay,
            self.config.max_reconnect_attempts,
        );

        loop {
            self.set_status(ConnectionStatus::Connecting);
            match self.connect_once(&mut policy).await {
                Ok(()) => {
                    info!(target: "stream", "Stream closed by server");
                }
                Err(e) if e.is_fatal() => {
                    warn!(target: "stream", error = %e, "Session unauthenticated, giving up");
                    self.set_status(ConnectionStatus::Unauthorized);
                    return;
                }
                Err(e) => {
                    warn!(target: "stream", error = %e, "Stream connection error");
                }
            }

            self.set_status(ConnectionStatus::Disconnected);
            match policy.next_delay() {
                Some(delay) => {
                    info!(
                        target: "stream",
                        attempt = policy.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling reconnect"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(target: "stream", "Reconnect attempts exhausted, degrading to polling");
                    self.set_status(ConnectionStatus::Failed);
                    return;
                }
            }
        }
    }

    /// One connection lifetime: open, then consume frames until the
    /// transport errors or the server closes the stream.
    async fn connect_once(&self, policy: &mut ReconnectPolicy) -> Result<()> {
        // Never attempt an unauthenticated connection
        if self.config.token.is_empty() {
            return Err(MonitorError::MissingToken);
        }

        // Token goes in the query string: the transport cannot carry headers
        let response = self
            .http
            .get(&self.config.stream_url)
            .query(&[("token", self.config.token.as_str())])
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MonitorError::Unauthorized(status.to_string()));
        }
        if !status.is_success() {
            return Err(MonitorError::StreamError(format!(
                "stream endpoint returned {}",
                status
            )));
        }

        self.set_status(ConnectionStatus::Live);
        policy.reset();
        self.touch_liveness().await;
        info!(target: "stream", url = %self.config.stream_url, "Dashboard stream connected");

        let mut parser = SseParser::new();
        let body = response.bytes_stream();
        tokio::pin!(body);

        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| MonitorError::StreamError(format!("transport error: {}", e)))?;
            for frame in parser.push(&chunk) {
                self.touch_liveness().await;
                if frame.channel == Channel::Heartbeat {
                    debug!(target: "stream", "Heartbeat received");
                    continue;
                }
                self.sink.dispatch(frame.channel, &frame.data).await;
            }
        }

        Ok(())
    }

    async fn touch_liveness(&self) {
        *self.last_event_at.write().await = Some(Instant::now());
    }

    fn set_status(&self, status: ConnectionStatus) {
        // Ignore error if the session no longer watches
        let _ = self.status_tx.send(status);
    }
}
