//! Mock reader service connector.
//!
//! Connections are scripted in advance through a [`MockConnectorHandle`].
//! Each call to [`connect`](Connector::connect) consumes the next scripted
//! outcome, in order.

use crate::error::{ReaderError, Result};
use crate::transport::{Connection, Connector, Frame};
use cardlink_core::Endpoint;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Mock connector for testing and development.
///
/// # Examples
///
/// ```
/// use cardlink_network::mock::MockConnector;
/// use cardlink_network::{Connection, Connector};
///
/// #[tokio::main]
/// async fn main() -> cardlink_network::Result<()> {
///     let (connector, handle) = MockConnector::new();
///
///     let service = handle.accept();
///     service.send_text(r#"{"result":{"E004":["ID1"]}}"#);
///
///     let mut connection = connector.connect(&Default::default()).await?;
///     assert!(connection.next_frame().await.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockConnector {
    shared: Arc<Shared>,
}

impl MockConnector {
    /// Create a connector with an empty script.
    ///
    /// Returns a tuple of (MockConnector, MockConnectorHandle) where the
    /// handle scripts the outcome of each connection attempt.
    pub fn new() -> (Self, MockConnectorHandle) {
        let shared = Arc::new(Shared::default());
        let connector = Self {
            shared: Arc::clone(&shared),
        };
        (connector, MockConnectorHandle { shared })
    }
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self, endpoint: &Endpoint) -> Result<MockConnection> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        lock(&self.shared.endpoints).push(endpoint.clone());

        let next = lock(&self.shared.script).pop_front();
        match next {
            Some(Scripted::Accept(connection)) => {
                debug!("Mock connection to {} accepted", endpoint);
                Ok(connection)
            }
            Some(Scripted::Refuse(reason)) => Err(ReaderError::connection_failed(reason)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(ReaderError::connection_failed("no scripted connection")),
        }
    }
}

/// Handle for scripting a [`MockConnector`].
#[derive(Debug, Clone)]
pub struct MockConnectorHandle {
    shared: Arc<Shared>,
}

impl MockConnectorHandle {
    /// Script the next attempt to succeed.
    ///
    /// The returned handle plays the service side of that connection.
    pub fn accept(&self) -> MockConnectionHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);

        let connection = MockConnection {
            event_rx,
            closed_tx,
        };
        lock(&self.shared.script).push_back(Scripted::Accept(connection));

        MockConnectionHandle {
            event_tx,
            closed_rx,
        }
    }

    /// Script the next attempt to be refused.
    pub fn refuse(&self, reason: impl Into<String>) {
        lock(&self.shared.script).push_back(Scripted::Refuse(reason.into()));
    }

    /// Script the next attempt to never complete.
    pub fn hang(&self) {
        lock(&self.shared.script).push_back(Scripted::Hang);
    }

    /// Number of connection attempts so far.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Endpoints of every connection attempt, in order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        lock(&self.shared.endpoints).clone()
    }
}

/// Client side of a scripted connection.
#[derive(Debug)]
pub struct MockConnection {
    event_rx: mpsc::UnboundedReceiver<ServiceEvent>,
    closed_tx: watch::Sender<bool>,
}

impl Connection for MockConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        if *self.closed_tx.borrow() {
            return None;
        }

        match self.event_rx.recv().await? {
            ServiceEvent::Frame(frame) => Some(Ok(frame)),
            ServiceEvent::Fail(reason) => Some(Err(ReaderError::protocol(reason))),
            ServiceEvent::Close => None,
        }
    }

    async fn close(&mut self) {
        self.event_rx.close();
        self.closed_tx.send_replace(true);
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.closed_tx.send_replace(true);
    }
}

/// Service side of a scripted connection.
#[derive(Debug, Clone)]
pub struct MockConnectionHandle {
    event_tx: mpsc::UnboundedSender<ServiceEvent>,
    closed_rx: watch::Receiver<bool>,
}

impl MockConnectionHandle {
    /// Push a text frame. Returns `false` if the client already closed.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send(ServiceEvent::Frame(Frame::Text(text.into())))
    }

    /// Push a binary frame. Returns `false` if the client already closed.
    pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) -> bool {
        self.send(ServiceEvent::Frame(Frame::Binary(bytes.into())))
    }

    /// Break the connection with a transport error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.send(ServiceEvent::Fail(reason.into()))
    }

    /// Close the connection from the service side.
    pub fn close(&self) -> bool {
        self.send(ServiceEvent::Close)
    }

    /// Whether the client closed or dropped the connection.
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Wait until the client closes or drops the connection.
    pub async fn wait_closed(&self) {
        let mut closed = self.closed_rx.clone();
        // An error means the connection was dropped, which counts as closed.
        let _ = closed.wait_for(|closed| *closed).await;
    }

    fn send(&self, event: ServiceEvent) -> bool {
        !self.is_closed() && self.event_tx.send(event).is_ok()
    }
}

#[derive(Debug)]
enum ServiceEvent {
    Frame(Frame),
    Fail(String),
    Close,
}

#[derive(Debug)]
enum Scripted {
    Accept(MockConnection),
    Refuse(String),
    Hang,
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<VecDeque<Scripted>>,
    endpoints: Mutex<Vec<Endpoint>>,
    connects: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
