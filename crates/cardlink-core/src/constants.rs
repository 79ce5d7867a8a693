//! Shared constants for the card reader client.
//!
//! This module centralizes every fixed value the reader service contract
//! relies on: placeholder strings shown in place of missing data, the avatar
//! data-URI marker, the service endpoints, and the default timeouts.
//!
//! # Reader Service Endpoints
//!
//! The reader service exposes two WebSocket paths on the same port:
//!
//! | Path | Behavior |
//! |------|----------|
//! | `/read-card` | Pushes one or more card messages after each connection |
//! | `/ws` | Passive feed, pushes raw frames as the service produces them |
//!
//! # Usage
//!
//! ```
//! use cardlink_core::constants::*;
//!
//! let endpoint = format!("ws://{}:{}{}", DEFAULT_HOST, DEFAULT_PORT, READ_CARD_PATH);
//! assert_eq!(endpoint, "ws://127.0.0.1:8081/read-card");
//! ```

// ============================================================================
// Placeholders
// ============================================================================

/// Placeholder for any profile field the card did not provide.
///
/// Every text field of a decoded profile holds either a value read from the
/// card or this string, so consumers never deal with missing values.
pub const NOT_SPECIFIED: &str = "Non spécifié";

/// Placeholder for an age that cannot be derived from the birth date.
pub const NOT_COMPUTABLE: &str = "Non calculé";

/// Localized label for sex code `M`.
pub const SEX_MALE_LABEL: &str = "Masculin";

/// Localized label for sex code `F`.
pub const SEX_FEMALE_LABEL: &str = "Féminin";

// ============================================================================
// Avatar
// ============================================================================

/// Marker that identifies an avatar already wrapped as a data URI.
pub const DATA_URI_MARKER: &str = "data:";

/// Prefix applied to bare base64 avatars.
///
/// The reader service only ever emits PNG portraits.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

// ============================================================================
// Endpoints
// ============================================================================

/// WebSocket URL scheme accepted by the client.
pub const WS_SCHEME: &str = "ws://";

/// Default reader service host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default reader service port.
pub const DEFAULT_PORT: u16 = 8081;

/// Path of the decoded card read endpoint.
pub const READ_CARD_PATH: &str = "/read-card";

/// Path of the passive raw feed endpoint.
pub const PASSIVE_FEED_PATH: &str = "/ws";

// ============================================================================
// Timeouts
// ============================================================================

/// Default time allowed to establish the WebSocket connection (milliseconds).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Default time allowed between opening a read and the first card message
/// (milliseconds).
///
/// Reading a chip including the portrait takes a few seconds on the field
/// readers, so the window is much larger than the connect timeout.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 15_000;

/// Upper bound for the close handshake before the socket is dropped
/// (milliseconds).
pub const CLOSE_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Age
// ============================================================================

/// Ages above this value are still reported but flagged as implausible.
pub const MAX_PLAUSIBLE_AGE: i32 = 150;
