// Monitoring configuration

use std::time::Duration;

/// Configuration for a dashboard monitoring session
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// SSE stream endpoint
    pub stream_url: String,
    /// Machine status endpoint used by the fallback poller
    pub status_url: String,
    /// Session token, passed as a query parameter (the stream transport
    /// does not support custom headers)
    pub token: String,
    /// Base delay for linear reconnect backoff
    pub reconnect_base_delay: Duration,
    /// Reconnect attempt cap; once reached the session degrades to polling
    pub max_reconnect_attempts: u32,
    /// Fallback poll interval
    pub poll_interval: Duration,
    /// HTTP connect timeout
    pub connect_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            stream_url: "http://127.0.0.1:8000/api/dashboard/stream".to_string(),
            status_url: "http://127.0.0.1:8000/api/machines/status".to_string(),
            token: String::new(),
            reconnect_base_delay: Duration::from_secs(3),
            max_reconnect_attempts: 5,
            poll_interval: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stream_url: std::env::var("QCMON_STREAM_URL").unwrap_or(defaults.stream_url),
            status_url: std::env::var("QCMON_STATUS_URL").unwrap_or(defaults.status_url),
            token: std::env::var("QCMON_TOKEN").unwrap_or_default(),
            reconnect_base_delay: std::env::var("QCMON_RECONNECT_BASE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_base_delay),
            max_reconnect_attempts: std::env::var("QCMON_MAX_RECONNECT_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_reconnect_attempts),
            poll_interval: std::env::var("QCMON_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            connect_timeout: std::env::var("QCMON_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_uses_defaults_when_unset() {
        std::env::remove_var("QCMON_RECONNECT_BASE_MS");
        std::env::remove_var("QCMON_MAX_RECONNECT_ATTEMPTS");

        let config = MonitorConfig::from_env();

        assert_eq!(config.reconnect_base_delay, Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn from_env_reads_connect_timeout() {
        std::env::set_var("QCMON_CONNECT_TIMEOUT_SECS", "25");

        let config = MonitorConfig::from_env();
        assert_eq!(config.connect_timeout, Duration::from_secs(25));

        std::env::remove_var("QCMON_CONNECT_TIMEOUT_SECS");
        let config = MonitorConfig::from_env();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
