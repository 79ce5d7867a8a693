//! Card message decoding for the reader client.
//!
//! This crate turns the JSON messages pushed by the card reader service into
//! typed [`Profile`] records. Decoding is pure: no I/O, no shared state, and
//! the same input always yields the same profile for a given reference date.
//!
//! # Pipeline
//!
//! ```text
//! text frame ──> RawCardMessage::parse ──> ProfileDecoder::decode ──> Profile
//!                   (JSON + envelope)        (field table, dates,
//!                                             age, avatar)
//! ```
//!
//! # Example
//!
//! ```
//! use cardlink_decoder::{Age, ProfileDecoder};
//! use chrono::NaiveDate;
//!
//! let text = r#"{"result":{"E004":["ID1","Dupont","Jean","15/06/1985","M"]},"time_taken":"120ms"}"#;
//! let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
//!
//! let profile = ProfileDecoder::new().decode_str(text, today).unwrap();
//! assert_eq!(profile.surname(), "Dupont");
//! assert_eq!(profile.age(), Age::Years(40));
//! assert_eq!(profile.city(), "Non spécifié");
//! ```

pub mod avatar;
pub mod date;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod message;
pub mod profile;

pub use avatar::normalize_avatar;
pub use date::{Age, calculate_age, format_date};
pub use decoder::{ProfileDecoder, decode_str, decode_value};
pub use error::DecodeError;
pub use layout::{FIRMWARE_V1, FieldLayout, PersonalField};
pub use message::{CardResult, FamilyMember, RawCardMessage};
pub use profile::{Profile, Sex};
