//! Transport abstraction between the read manager and the reader service.
//!
//! The manager only needs three things from a transport: open a connection,
//! pull the next frame, and close. Keeping these behind traits lets the
//! WebSocket transport and the scripted [`mock`](crate::mock) transport be
//! swapped without touching the read logic.
//!
//! Futures are required to be `Send` so reads can run on spawned Tokio
//! tasks.

use crate::error::Result;
use cardlink_core::Endpoint;
use std::future::Future;

/// Application frame received from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    /// Frame payload as text.
    ///
    /// Binary frames are accepted when they hold valid UTF-8; some reader
    /// builds send JSON as binary frames.
    pub fn into_text(self) -> std::result::Result<String, Vec<u8>> {
        match self {
            Frame::Text(text) => Ok(text),
            Frame::Binary(bytes) => String::from_utf8(bytes).map_err(|e| e.into_bytes()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opens connections to the reader service.
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Open a connection to `endpoint`.
    ///
    /// Completion means the connection is open; no request is sent.
    fn connect(&self, endpoint: &Endpoint)
    -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// An open connection to the reader service.
pub trait Connection: Send + 'static {
    /// Next application frame.
    ///
    /// Returns `None` once the service has closed the connection. Control
    /// frames are handled by the transport and never returned.
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<Frame>>> + Send;

    /// Close the connection. Idempotent; errors are logged, not returned.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
