// QCMon Core Library
// Real-time monitoring core for the manufacturing quality-control dashboard

pub mod config;
pub mod event;
pub mod poller;
pub mod reconnect;
pub mod session;
pub mod sink;
pub mod snapshot;
pub mod stream;

// Export core types
pub use config::MonitorConfig;
pub use event::{Channel, NamedEvent, SseFrame, SseParser};
pub use poller::{FallbackPoller, HttpStatusFetcher, StatusFetcher};
pub use reconnect::ReconnectPolicy;
pub use session::MonitorSession;
pub use sink::{AlertNotifier, LogNotifier, StateSink};
pub use snapshot::{
    AlertCounters, DashboardSnapshot, Kpis, MachineStatus, Severity, UpdatePayload,
};
pub use stream::{ConnectionStatus, StreamClient};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("missing session token")]
    MissingToken,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("poll error: {0}")]
    PollError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Auth failures are terminal for the session; everything else is
    /// retriable by the reconnection policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::MissingToken | MonitorError::Unauthorized(_)
        )
    }
}
