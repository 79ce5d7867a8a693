//! Card read manager.
//!
//! This module provides the [`CardReadManager`], which owns the connection
//! of the current read, hands every inbound frame to the decoder, and
//! publishes the outcome as a [`ReadState`] that a presentation layer can
//! observe.
//!
//! # Read Lifecycle
//!
//! ```text
//!            start_read()
//!   Idle ─────────────────> Loading ──frame──> Ready(profile)
//!                              │                  │  ▲
//!                              │                  └──┘ later frames overwrite
//!                              ├──timeout──> Failed(Timeout)
//!                              ├──error────> Failed(Transport)
//!                              ├──closed───> Failed(Closed)
//!                              └──bad frame> Failed(Decode)
//! ```
//!
//! # Superseded Reads
//!
//! Every read gets a monotonically increasing [`ReadId`]. Starting a new
//! read cancels the previous one (its connection is closed) and every
//! publication is guarded by the read id held in the state, so a frame from
//! an older connection can never overwrite the outcome of a newer request,
//! whatever order the frames arrive in.
//!
//! # Example
//!
//! ```no_run
//! use cardlink_network::{CardReadManager, ReaderConfig, ReadState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = CardReadManager::new(ReaderConfig::default());
//! let mut states = manager.subscribe();
//!
//! manager.start_read();
//! while states.changed().await.is_ok() {
//!     match &*states.borrow_and_update() {
//!         ReadState::Loading { .. } => println!("Reading card..."),
//!         ReadState::Ready { profile, .. } => println!("{}", profile.full_name()),
//!         ReadState::Failed { failure, .. } => eprintln!("{failure}"),
//!         ReadState::Idle => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::transport::{Connection, Connector, Frame};
use crate::ws::WsConnector;
use cardlink_core::ReadId;
use cardlink_decoder::{Profile, ProfileDecoder};
use chrono::Local;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why a read did not produce a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// Connection could not be opened or broke before any message.
    Transport(String),

    /// Nothing arrived in time.
    Timeout { duration_ms: u64 },

    /// A frame could not be decoded into a profile.
    Decode(String),

    /// Service closed the connection without sending a message.
    Closed,

    /// Read was cancelled or superseded before completing.
    Cancelled,
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "Reader service unavailable: {message}"),
            Self::Timeout { duration_ms } => {
                write!(f, "No card data received after {duration_ms}ms")
            }
            Self::Decode(message) => write!(f, "Unreadable card data: {message}"),
            Self::Closed => f.write_str("Reader service closed the connection without card data"),
            Self::Cancelled => f.write_str("Read cancelled"),
        }
    }
}

impl std::error::Error for ReadFailure {}

impl From<ReaderError> for ReadFailure {
    fn from(error: ReaderError) -> Self {
        match error {
            ReaderError::ConnectTimeout(duration_ms)
            | ReaderError::ResponseTimeout(duration_ms) => Self::Timeout { duration_ms },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Observable outcome of the current read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadState {
    /// No read requested yet, or the last one was cancelled.
    #[default]
    Idle,

    Loading {
        read_id: ReadId,
    },

    Ready {
        read_id: ReadId,
        profile: Arc<Profile>,
    },

    Failed {
        read_id: ReadId,
        failure: ReadFailure,
    },
}

impl ReadState {
    /// Read this state belongs to.
    pub fn read_id(&self) -> Option<ReadId> {
        match self {
            Self::Idle => None,
            Self::Loading { read_id }
            | Self::Ready { read_id, .. }
            | Self::Failed { read_id, .. } => Some(*read_id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn profile(&self) -> Option<&Arc<Profile>> {
        match self {
            Self::Ready { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ReadFailure> {
        match self {
            Self::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Flattened `{loading, profile, error}` view.
    pub fn status(&self) -> ReadStatus {
        ReadStatus {
            loading: self.is_loading(),
            profile: self.profile().cloned(),
            error: self.failure().map(ToString::to_string),
        }
    }
}

impl fmt::Display for ReadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading { read_id } => write!(f, "Loading({read_id})"),
            Self::Ready { read_id, .. } => write!(f, "Ready({read_id})"),
            Self::Failed { read_id, .. } => write!(f, "Failed({read_id})"),
        }
    }
}

/// Snapshot for consumers that render from plain flags.
///
/// At most one of `loading`, `profile`, and `error` is set; all unset means
/// idle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadStatus {
    pub loading: bool,
    pub profile: Option<Arc<Profile>>,
    pub error: Option<String>,
}

/// Lifecycle of the connection serving the current read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Open => "Open",
            Self::Closed => "Closed",
        };
        f.write_str(state)
    }
}

/// Connection state tagged with the read it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub read_id: Option<ReadId>,
    pub state: ConnectionState,
}

/// Writes the outcome of one read, if that read is still current.
struct Publisher {
    read_id: ReadId,
    state: Arc<watch::Sender<ReadState>>,
    connection: Arc<watch::Sender<ConnectionStatus>>,
}

impl Publisher {
    /// Replace the read state. Returns `false` if the read was superseded.
    fn publish(&self, next: ReadState) -> bool {
        let read_id = self.read_id;
        self.state.send_if_modified(move |current| {
            if current.read_id() == Some(read_id) {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    fn ready(&self, profile: Profile) -> bool {
        self.publish(ReadState::Ready {
            read_id: self.read_id,
            profile: Arc::new(profile),
        })
    }

    fn fail(&self, failure: ReadFailure) -> bool {
        self.publish(ReadState::Failed {
            read_id: self.read_id,
            failure,
        })
    }

    fn connection(&self, state: ConnectionState) {
        let read_id = self.read_id;
        self.connection.send_if_modified(move |current| {
            if current.read_id == Some(read_id) && current.state != state {
                current.state = state;
                true
            } else {
                false
            }
        });
    }
}

/// Read currently owning the connection.
struct InFlight {
    read_id: ReadId,
    token: CancellationToken,
}

/// Coordinates card reads against the reader service.
///
/// The manager is the single owner of the read state. It must be used from
/// within a Tokio runtime: every read runs on its own spawned task.
pub struct CardReadManager<C: Connector = WsConnector> {
    connector: Arc<C>,
    config: ReaderConfig,
    decoder: ProfileDecoder,
    state: Arc<watch::Sender<ReadState>>,
    connection: Arc<watch::Sender<ConnectionStatus>>,
    last_read: Option<ReadId>,
    in_flight: Option<InFlight>,
}

impl CardReadManager<WsConnector> {
    /// Manager reading over WebSocket.
    pub fn new(config: ReaderConfig) -> Self {
        let connector = WsConnector::new(config.connect_timeout);
        Self::with_connector(connector, config)
    }
}

impl<C: Connector> CardReadManager<C> {
    /// Manager reading through a custom transport.
    pub fn with_connector(connector: C, config: ReaderConfig) -> Self {
        let (state, _) = watch::channel(ReadState::Idle);
        let (connection, _) = watch::channel(ConnectionStatus::default());

        Self {
            connector: Arc::new(connector),
            config,
            decoder: ProfileDecoder::new(),
            state: Arc::new(state),
            connection: Arc::new(connection),
            last_read: None,
            in_flight: None,
        }
    }

    /// Use a specific decoder, for example one bound to another firmware
    /// layout.
    #[must_use]
    pub fn with_decoder(mut self, decoder: ProfileDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Start a new read, superseding any read in flight.
    ///
    /// The state switches to `Loading` immediately and any previous profile
    /// or error is cleared. The outcome is published through
    /// [`subscribe`](Self::subscribe).
    pub fn start_read(&mut self) -> ReadId {
        self.supersede();

        let read_id = self.last_read.map_or(ReadId::FIRST, |id| id.next());
        self.last_read = Some(read_id);

        self.state.send_replace(ReadState::Loading { read_id });
        self.connection.send_replace(ConnectionStatus {
            read_id: Some(read_id),
            state: ConnectionState::Idle,
        });

        info!(%read_id, endpoint = %self.config.endpoint, "Starting card read");

        let token = CancellationToken::new();
        let publisher = Publisher {
            read_id,
            state: Arc::clone(&self.state),
            connection: Arc::clone(&self.connection),
        };

        tokio::spawn(run_read(
            Arc::clone(&self.connector),
            self.config.clone(),
            self.decoder,
            publisher,
            token.clone(),
        ));

        self.in_flight = Some(InFlight { read_id, token });
        read_id
    }

    /// Cancel the read in flight, if any, and return to `Idle`.
    ///
    /// A read that already produced a profile or an error keeps its state.
    pub fn cancel(&mut self) {
        let Some(read_id) = self.supersede() else {
            return;
        };

        self.state.send_if_modified(|current| {
            if *current == (ReadState::Loading { read_id }) {
                *current = ReadState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Cancel the in-flight task, returning its read id.
    fn supersede(&mut self) -> Option<ReadId> {
        let in_flight = self.in_flight.take()?;
        debug!(read_id = %in_flight.read_id, "Cancelling read in flight");
        in_flight.token.cancel();
        Some(in_flight.read_id)
    }

    /// Receiver for every state change.
    pub fn subscribe(&self) -> watch::Receiver<ReadState> {
        self.state.subscribe()
    }

    /// Receiver for connection lifecycle changes of the current read.
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.subscribe()
    }

    pub fn state(&self) -> ReadState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ReadStatus {
        self.state.borrow().status()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.borrow().state
    }

    /// Start a read and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`ReadFailure`] of the read, or
    /// [`ReadFailure::Cancelled`] if it was superseded before completing.
    pub async fn read_profile(&mut self) -> Result<Arc<Profile>, ReadFailure> {
        let mut states = self.subscribe();
        let read_id = self.start_read();

        let outcome = states
            .wait_for(|state| state.read_id() != Some(read_id) || !state.is_loading())
            .await
            .map_err(|_| ReadFailure::Cancelled)?
            .clone();

        match outcome {
            ReadState::Ready { read_id: id, profile } if id == read_id => Ok(profile),
            ReadState::Failed { read_id: id, failure } if id == read_id => Err(failure),
            _ => Err(ReadFailure::Cancelled),
        }
    }
}

impl<C: Connector> Drop for CardReadManager<C> {
    fn drop(&mut self) {
        self.supersede();
    }
}

/// Drive one read from connect to close.
async fn run_read<C: Connector>(
    connector: Arc<C>,
    config: ReaderConfig,
    decoder: ProfileDecoder,
    publisher: Publisher,
    token: CancellationToken,
) {
    let read_id = publisher.read_id;
    publisher.connection(ConnectionState::Connecting);

    let connected = tokio::select! {
        _ = token.cancelled() => {
            debug!(%read_id, "Read cancelled while connecting");
            publisher.connection(ConnectionState::Closed);
            return;
        }
        result = connector.connect(&config.endpoint) => result,
    };

    let mut connection = match connected {
        Ok(connection) => connection,
        Err(e) => {
            warn!(%read_id, "Could not open reader connection: {}", e);
            publisher.connection(ConnectionState::Closed);
            publisher.fail(e.into());
            return;
        }
    };

    publisher.connection(ConnectionState::Open);
    debug!(%read_id, "Reader connection open, waiting for card data");

    let response_timeout = config.response_timeout;
    let deadline = Instant::now() + response_timeout;
    let mut delivered = 0usize;

    loop {
        let frame = tokio::select! {
            _ = token.cancelled() => {
                debug!(%read_id, "Read superseded, closing connection");
                break;
            }
            _ = tokio::time::sleep_until(deadline), if delivered == 0 => {
                let timeout = ReaderError::ResponseTimeout(response_timeout.as_millis() as u64);
                warn!(%read_id, "{}, closing connection", timeout);
                publisher.fail(timeout.into());
                break;
            }
            frame = connection.next_frame() => frame,
        };

        match frame {
            Some(Ok(frame)) => {
                delivered += 1;
                let published = match decode_frame(&decoder, frame) {
                    Ok(profile) => {
                        info!(%read_id, message = delivered, "Card profile decoded");
                        publisher.ready(profile)
                    }
                    Err(failure) => {
                        warn!(%read_id, message = delivered, "{}", failure);
                        publisher.fail(failure)
                    }
                };
                if !published {
                    debug!(%read_id, "Discarding message from superseded read");
                    break;
                }
            }
            Some(Err(e)) => {
                if delivered == 0 {
                    error!(%read_id, "Reader connection failed: {}", e);
                    publisher.fail(e.into());
                } else {
                    warn!(%read_id, "Reader connection failed after delivery: {}", e);
                }
                break;
            }
            None => {
                if delivered == 0 {
                    warn!(%read_id, "Reader service closed the connection without data");
                    publisher.fail(ReadFailure::Closed);
                } else {
                    debug!(%read_id, messages = delivered, "Reader service closed the connection");
                }
                break;
            }
        }
    }

    connection.close().await;
    publisher.connection(ConnectionState::Closed);
}

/// Decode one frame with today's date.
fn decode_frame(decoder: &ProfileDecoder, frame: Frame) -> Result<Profile, ReadFailure> {
    let text = frame.into_text().map_err(|bytes| {
        ReadFailure::Decode(format!("binary frame of {} bytes is not UTF-8", bytes.len()))
    })?;

    decoder
        .decode_str(&text, Local::now().date_naive())
        .map_err(|e| ReadFailure::Decode(e.to_string()))
}
