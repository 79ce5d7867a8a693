//! Passive listener for the raw reader feed.
//!
//! Some reader builds push every card read on a `/ws` feed instead of
//! answering a dedicated request. The [`PassiveListener`] connects to that
//! feed and hands back each raw frame in arrival order, without decoding,
//! until the service closes the connection.

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::transport::{Connection, Connector};
use crate::ws::WsConnector;
use cardlink_core::Endpoint;
use tracing::{debug, info, trace};

/// Connects to the passive feed of the reader service.
///
/// # Example
///
/// ```no_run
/// use cardlink_network::{PassiveListener, ReaderConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let listener = PassiveListener::new(&ReaderConfig::default());
/// let mut feed = listener.listen().await?;
///
/// while let Some(message) = feed.next_message().await {
///     println!("{}", message?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PassiveListener<C: Connector = WsConnector> {
    connector: C,
    endpoint: Endpoint,
}

impl PassiveListener<WsConnector> {
    /// Listener on the `/ws` feed of the configured service.
    pub fn new(config: &ReaderConfig) -> Self {
        Self::with_connector(
            WsConnector::new(config.connect_timeout),
            config.passive_endpoint(),
        )
    }
}

impl<C: Connector> PassiveListener<C> {
    pub fn with_connector(connector: C, endpoint: Endpoint) -> Self {
        Self {
            connector,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Open the feed.
    ///
    /// # Errors
    ///
    /// Returns the connector error if the feed cannot be opened.
    pub async fn listen(&self) -> Result<PassiveFeed<C::Connection>> {
        let connection = self.connector.connect(&self.endpoint).await?;
        info!("Listening on passive feed {}", self.endpoint);

        Ok(PassiveFeed {
            connection,
            received: 0,
        })
    }
}

/// Open passive feed.
///
/// Messages are handed to the caller and not retained; only a count is kept.
#[derive(Debug)]
pub struct PassiveFeed<T: Connection> {
    connection: T,
    received: u64,
}

impl<T: Connection> PassiveFeed<T> {
    /// Next raw message.
    ///
    /// Binary frames are converted to text, replacing invalid UTF-8.
    /// Returns `None` once the service closes the feed.
    pub async fn next_message(&mut self) -> Option<Result<String>> {
        let frame = match self.connection.next_frame().await? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };

        let message = frame
            .into_text()
            .unwrap_or_else(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        trace!(len = message.len(), "Passive feed message");
        self.received += 1;
        Some(Ok(message))
    }

    /// Number of messages received so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Close the feed, returning the number of messages received.
    pub async fn close(mut self) -> u64 {
        debug!(messages = self.received, "Closing passive feed");
        self.connection.close().await;
        self.received
    }
}
