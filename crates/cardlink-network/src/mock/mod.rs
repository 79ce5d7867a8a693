//! Scripted transport for testing without a reader service.
//!
//! This module provides a [`Connector`](crate::Connector) whose connections
//! are controlled programmatically, so read flows (timeouts, overlapping
//! reads, late frames) can be exercised deterministically.

pub mod connector;

pub use connector::{MockConnection, MockConnectionHandle, MockConnector, MockConnectorHandle};
