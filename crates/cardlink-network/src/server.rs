//! Reader service emulator.
//!
//! This module provides a small WebSocket server that behaves like the card
//! reader service: clients connecting to `/read-card` or `/ws` receive the
//! configured card messages, then the connection is closed. It backs the
//! integration tests and the `cardlink emulate` command, so the client can be
//! exercised without a reader attached.
//!
//! # Architecture
//!
//! ```text
//! CardReadManager ──(/read-card)──┐
//!                                 ├──> ReaderServiceEmulator ──> configured frames
//! PassiveListener ──(/ws)─────────┘
//! ```
//!
//! # Design Principles
//!
//! - **No request parsing**: frames are pushed as soon as the upgrade
//!   completes, like the real service
//! - **Unknown paths rejected** with `404` during the handshake
//! - **One task per connection** in [`serve`](ReaderServiceEmulator::serve)

use crate::error::{ReaderError, Result};
use cardlink_core::Endpoint;
use cardlink_core::constants::{PASSIVE_FEED_PATH, READ_CARD_PATH};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tracing::{debug, error, info, trace, warn};

/// Configuration for the emulator.
///
/// # Example
///
/// ```
/// use cardlink_network::EmulatorConfig;
/// use std::time::Duration;
///
/// let config = EmulatorConfig {
///     bind_addr: "127.0.0.1:0".parse().unwrap(),
///     ..EmulatorConfig::default()
/// }
/// .with_frame(r#"{"result":{"E004":["ID1","Dupont"]}}"#)
/// .with_delay(Duration::from_millis(200));
///
/// assert_eq!(config.frames.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Address to bind the emulator to
    pub bind_addr: SocketAddr,

    /// Frames pushed to every client, in order
    pub frames: Vec<String>,

    /// Pause between the upgrade and the first frame
    pub delay: Duration,

    /// Keep connections open after the last frame until the client closes
    pub hold_open: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], cardlink_core::constants::DEFAULT_PORT)),
            frames: Vec::new(),
            delay: Duration::ZERO,
            hold_open: false,
        }
    }
}

impl EmulatorConfig {
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_hold_open(mut self, hold_open: bool) -> Self {
        self.hold_open = hold_open;
        self
    }
}

/// WebSocket server emulating the card reader service.
///
/// # Example
///
/// ```no_run
/// use cardlink_network::{CardReadManager, EmulatorConfig, ReaderConfig, ReaderServiceEmulator};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EmulatorConfig {
///     bind_addr: "127.0.0.1:0".parse()?,
///     ..EmulatorConfig::default()
/// }
/// .with_frame(r#"{"result":{"E004":["ID1","Dupont","Jean"]}}"#);
///
/// let emulator = ReaderServiceEmulator::bind(config).await?;
/// let endpoint = emulator.endpoint()?;
/// let _server = emulator.spawn();
///
/// let mut manager = CardReadManager::new(ReaderConfig::new(endpoint));
/// let profile = manager.read_profile().await?;
/// assert_eq!(profile.surname(), "Dupont");
/// # Ok(())
/// # }
/// ```
pub struct ReaderServiceEmulator {
    /// TCP listener for accepting new connections
    listener: TcpListener,

    /// Shared with every connection task
    config: Arc<EmulatorConfig>,
}

impl ReaderServiceEmulator {
    /// Bind the emulator to the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::BindFailed`] if the address is in use or not
    /// available.
    pub async fn bind(config: EmulatorConfig) -> Result<Self> {
        info!("Binding reader service emulator to {}", config.bind_addr);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|_| ReaderError::BindFailed(config.bind_addr))?;

        info!(
            "Reader service emulator listening on {} ({} frames)",
            listener.local_addr()?,
            config.frames.len()
        );

        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// Address actually bound, useful with port `0`.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Decoded read endpoint served by this emulator.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let addr = self.local_addr()?;
        Ok(Endpoint::read_card(&addr.ip().to_string(), addr.port())?)
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Accept and serve a single connection, returning the requested path.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails, the handshake is rejected, or
    /// the client drops mid-stream.
    pub async fn serve_one(&self) -> Result<String> {
        let (stream, addr) = self.listener.accept().await?;
        handle_connection(stream, addr, &self.config).await
    }

    /// Serve connections until the listener fails.
    ///
    /// Each connection runs on its own task; a failing connection is logged
    /// and does not stop the server.
    ///
    /// # Errors
    ///
    /// Returns an error only if the listener socket fails.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            debug!("Accepted new connection from {}", addr);

            let config = Arc::clone(&self.config);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, &config).await {
                    warn!("Connection from {} ended with error: {}", addr, e);
                }
            });
        }
    }

    /// Serve on a background task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.serve())
    }
}

/// Upgrade, push the configured frames, and close.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    config: &EmulatorConfig,
) -> Result<String> {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }

    let mut path = String::new();
    let callback = |request: &Request, response: Response| {
        path = request.uri().path().to_string();
        if path == READ_CARD_PATH || path == PASSIVE_FEED_PATH {
            Ok(response)
        } else {
            let mut rejection = ErrorResponse::new(Some(format!("unknown path {path}")));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        }
    };

    let mut ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("Handshake with {} rejected: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Client {} connected on {}", addr, path);

    if !config.delay.is_zero() {
        tokio::time::sleep(config.delay).await;
    }

    for frame in &config.frames {
        trace!(len = frame.len(), "Sending frame to {}", addr);
        if let Err(e) = ws.send(Message::Text(frame.clone())).await {
            error!("Failed to send frame to {}: {}", addr, e);
            return Err(e.into());
        }
    }

    if config.hold_open {
        debug!("Holding connection with {} open", addr);
        drain(&mut ws).await;
    } else {
        if let Err(e) = ws.close(None).await {
            debug!("Error during close with {}: {}", addr, e);
        }
        drain(&mut ws).await;
    }

    info!("Client {} disconnected", addr);
    Ok(path)
}

/// Read until the client closes, discarding anything it sends.
async fn drain(ws: &mut WebSocketStream<TcpStream>) {
    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EmulatorConfig::default();
        assert_eq!(config.bind_addr.port(), 8081);
        assert!(config.frames.is_empty());
        assert!(config.delay.is_zero());
        assert!(!config.hold_open);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = EmulatorConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..EmulatorConfig::default()
        };
        let emulator = ReaderServiceEmulator::bind(config).await.unwrap();

        let endpoint = emulator.endpoint().unwrap();
        assert_ne!(endpoint.port(), 0);
        assert_eq!(endpoint.path(), "/read-card");
    }

    #[tokio::test]
    async fn test_ipv6_endpoint_is_bracketed() {
        let config = EmulatorConfig {
            bind_addr: "[::1]:0".parse().unwrap(),
            ..EmulatorConfig::default()
        };
        // Hosts without an IPv6 loopback cannot bind here.
        let Ok(emulator) = ReaderServiceEmulator::bind(config).await else {
            return;
        };

        let endpoint = emulator.endpoint().unwrap();
        let url = endpoint.url();
        assert!(url.starts_with("ws://[::1]:"), "{url}");
        assert!(url.ends_with("/read-card"));
        assert_eq!(url.parse::<Endpoint>().unwrap(), endpoint);
    }

    #[tokio::test]
    async fn test_bind_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = EmulatorConfig {
            bind_addr: taken.local_addr().unwrap(),
            ..EmulatorConfig::default()
        };

        match ReaderServiceEmulator::bind(config).await {
            Err(ReaderError::BindFailed(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("bound an address already in use"),
        }
    }
}
