//! Reader client configuration.

use cardlink_core::Endpoint;
use cardlink_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_RESPONSE_TIMEOUT_MS, PASSIVE_FEED_PATH,
};
use std::time::Duration;

/// Configuration for card reads.
///
/// # Example
///
/// ```
/// use cardlink_network::ReaderConfig;
/// use std::time::Duration;
///
/// let config = ReaderConfig::new("ws://192.168.56.1:8081/read-card".parse().unwrap())
///     .with_response_timeout(Duration::from_secs(30));
///
/// assert_eq!(config.passive_endpoint().to_string(), "ws://192.168.56.1:8081/ws");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Decoded read endpoint, normally `/read-card`
    pub endpoint: Endpoint,

    /// Time allowed for the WebSocket handshake
    pub connect_timeout: Duration,

    /// Time allowed between connection open and the first card message
    pub response_timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
        }
    }
}

impl ReaderConfig {
    /// Default timeouts against `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Compose and validate a service endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`cardlink_core::Error::InvalidEndpoint`] if the host is empty
    /// or contains URL delimiters.
    pub fn endpoint_for(host: &str, port: u16, path: &str) -> cardlink_core::Result<Endpoint> {
        Endpoint::new(host, port, path)
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Passive feed endpoint on the same service.
    pub fn passive_endpoint(&self) -> Endpoint {
        self.endpoint.with_path(PASSIVE_FEED_PATH)
    }
}
