//! WebSocket transport to the reader service.
//!
//! This module provides the production [`Connector`] used by the read
//! manager and the passive listener. It wraps `tokio-tungstenite` with the
//! timeouts the reader service needs and hides control frames from callers.
//!
//! # Architecture
//!
//! ```text
//! CardReadManager / PassiveListener
//!     │
//!     └─> WsConnector ───(ws://host:8081)───> Reader service
//!            │
//!            └─> WsConnection (text/binary frames only)
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: the caller starts a new read instead
//! - **No outbound frames**: the service pushes data as soon as the
//!   connection opens
//! - **Bounded close**: the close handshake is abandoned after a short
//!   timeout so a dead service never blocks a new read

use crate::error::{ReaderError, Result};
use crate::transport::{Connection, Connector, Frame};
use cardlink_core::Endpoint;
use cardlink_core::constants::{CLOSE_TIMEOUT_MS, DEFAULT_CONNECT_TIMEOUT_MS};
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections with a handshake timeout.
///
/// # Example
///
/// ```no_run
/// use cardlink_network::{Connection, Connector, WsConnector};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = WsConnector::new(Duration::from_millis(3000));
/// let mut connection = connector.connect(&"ws://127.0.0.1:8081/read-card".parse()?).await?;
///
/// while let Some(frame) = connection.next_frame().await {
///     println!("Received: {:?}", frame?);
/// }
/// connection.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS))
    }
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self, endpoint: &Endpoint) -> Result<WsConnection> {
        info!("Connecting to reader service at {}", endpoint);

        let url = endpoint.url();
        let stream = match tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
        {
            Ok(Ok((stream, response))) => {
                info!(
                    status = %response.status(),
                    "WebSocket connection established with {}", endpoint
                );
                stream
            }
            Ok(Err(e)) => {
                error!("Connection to {} failed: {}", endpoint, e);
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    "Connection timeout after {}ms",
                    self.connect_timeout.as_millis()
                );
                return Err(ReaderError::ConnectTimeout(
                    self.connect_timeout.as_millis() as u64,
                ));
            }
        };

        Ok(WsConnection {
            endpoint: endpoint.clone(),
            stream: Some(stream),
        })
    }
}

/// Open WebSocket connection to the reader service.
pub struct WsConnection {
    endpoint: Endpoint,

    /// None once closed
    stream: Option<WsStream>,
}

impl WsConnection {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            let stream = self.stream.as_mut()?;

            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!(len = text.len(), "Received text frame");
                    return Some(Ok(Frame::Text(text)));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    trace!(len = bytes.len(), "Received binary frame");
                    return Some(Ok(Frame::Binary(bytes)));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Close frame received from {}", self.endpoint);
                    return None;
                }
                Some(Ok(_)) => {
                    // Ping/pong are answered by tungstenite.
                    continue;
                }
                Some(Err(e)) => {
                    let error = ReaderError::from(e);
                    if matches!(error, ReaderError::ConnectionLost(_)) {
                        debug!("Connection to {} closed", self.endpoint);
                        return None;
                    }
                    error!("Failed to read frame: {}", error);
                    return Some(Err(error));
                }
                None => {
                    debug!("Stream from {} ended", self.endpoint);
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        info!("Closing connection to {}", self.endpoint);

        let close_timeout = Duration::from_millis(CLOSE_TIMEOUT_MS);
        match tokio::time::timeout(close_timeout, stream.close(None)).await {
            Ok(Ok(())) => debug!("Close handshake completed"),
            Ok(Err(e)) => debug!("Error during close: {}", e),
            Err(_) => warn!(
                "Close timeout ({}ms), dropping connection",
                close_timeout.as_millis()
            ),
        }
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("endpoint", &self.endpoint)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("WsConnection dropped while open - socket will be closed");
        }
    }
}
