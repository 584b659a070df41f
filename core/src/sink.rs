// Dashboard state sink
//
// Applies dispatched stream events to the in-memory snapshot, independent of
// transport. Rendering stays outside: UI layers subscribe to the refresh
// channel and re-read the snapshot.

use crate::event::{Channel, NamedEvent};
use crate::snapshot::{DashboardSnapshot, MachineStatus, UpdatePayload};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Side-effect receiver for named occurrences (toast/banner layer)
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, event: NamedEvent, payload: &Value);
}

/// Default notifier: structured log lines only
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, event: NamedEvent, _payload: &Value) {
        info!(target: "sink", event = event.name(), "Dashboard alert");
    }
}

/// Envelope carried on the `event` channel
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    name: String,
    #[serde(default)]
    payload: Value,
}

/// Single writer over the dashboard snapshot
#[derive(Clone)]
pub struct StateSink {
    snapshot: Arc<RwLock<DashboardSnapshot>>,
    notifier: Arc<dyn AlertNotifier>,
    refresh_tx: broadcast::Sender<Channel>,
}

impl StateSink {
    pub fn new(notifier: Arc<dyn AlertNotifier>) -> Self {
        let (refresh_tx, _) = broadcast::channel(64);
        Self {
            snapshot: Arc::new(RwLock::new(DashboardSnapshot::default())),
            notifier,
            refresh_tx,
        }
    }

    /// Current snapshot, cloned for the reader
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Subscribe to refresh signals; each value names the channel that
    /// mutated the snapshot
    pub fn subscribe_refresh(&self) -> broadcast::Receiver<Channel> {
        self.refresh_tx.subscribe()
    }

    /// Route one stream event by channel tag.
    ///
    /// A malformed payload is logged and discarded without tearing anything
    /// down; the connection owns its own lifecycle.
    pub async fn dispatch(&self, channel: Channel, data: &str) {
        match channel {
            Channel::Heartbeat => {
                debug!(target: "sink", "Heartbeat");
            }
            Channel::Initial => match serde_json::from_str::<DashboardSnapshot>(data) {
                Ok(full) => {
                    self.snapshot.write().await.apply_initial(full);
                    self.notify_refresh(channel);
                }
                Err(e) => {
                    warn!(target: "sink", error = %e, "Discarding malformed initial snapshot");
                }
            },
            // Generic messages carry the same partial shape as updates
            Channel::Update | Channel::Message => match serde_json::from_str::<UpdatePayload>(data)
            {
                Ok(partial) => {
                    self.snapshot.write().await.apply_update(partial);
                    self.notify_refresh(channel);
                }
                Err(e) => {
                    warn!(target: "sink", error = %e, "Discarding malformed update");
                }
            },
            Channel::Event => match serde_json::from_str::<EventEnvelope>(data) {
                Ok(envelope) => self.apply_named_event(&envelope.name, &envelope.payload).await,
                Err(e) => {
                    warn!(target: "sink", error = %e, "Discarding malformed named event");
                }
            },
        }
    }

    /// Trigger side-effect notifications for recognized names; unrecognized
    /// names are logged and ignored, never fatal
    pub async fn apply_named_event(&self, name: &str, payload: &Value) {
        match NamedEvent::from_name(name) {
            Some(event) => {
                self.notifier.notify(event, payload).await;
                self.notify_refresh(Channel::Event);
            }
            None => {
                warn!(target: "sink", name = %name, "Ignoring unrecognized named event");
            }
        }
    }

    /// Fallback poller refresh path: machine list only
    pub async fn replace_machines(&self, machines: Vec<MachineStatus>) {
        self.snapshot.write().await.replace_machines(machines);
        self.notify_refresh(Channel::Update);
    }

    fn notify_refresh(&self, channel: Channel) {
        // Ignore error if no renderers are subscribed
        let _ = self.refresh_tx.send(channel);
    }
}
