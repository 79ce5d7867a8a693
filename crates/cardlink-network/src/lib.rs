//! Reader service client for Cardlink
//!
//! This crate connects to the card reader service over WebSocket, decodes the
//! card messages it pushes, and exposes the outcome of each read as an
//! observable state.
//!
//! # Components
//!
//! - **CardReadManager**: one decoded read at a time, superseding older reads
//! - **PassiveListener**: raw messages from the `/ws` feed
//! - **ReaderServiceEmulator**: local stand-in for the reader service
//! - **mock**: scripted transport for tests
//!
//! # Example
//!
//! ```no_run
//! use cardlink_network::{CardReadManager, ReaderConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReaderConfig::new("ws://192.168.56.1:8081/read-card".parse()?)
//!     .with_response_timeout(Duration::from_secs(20));
//!
//! let mut manager = CardReadManager::new(config);
//! let profile = manager.read_profile().await?;
//! println!("{} ({})", profile.full_name(), profile.age());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod manager;
pub mod mock;
mod passive;
mod server;
mod transport;
mod ws;

pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use manager::{
    CardReadManager, ConnectionState, ConnectionStatus, ReadFailure, ReadState, ReadStatus,
};
pub use passive::{PassiveFeed, PassiveListener};
pub use server::{EmulatorConfig, ReaderServiceEmulator};
pub use transport::{Connection, Connector, Frame};
pub use ws::{WsConnection, WsConnector};
