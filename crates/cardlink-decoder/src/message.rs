//! Wire shape of the messages pushed by the reader service.
//!
//! ```json
//! {
//!   "result": {
//!     "E004": ["ID1", "Dupont", "Jean", "15/06/1985", "M", ...],
//!     "E006": [{"Nom": "Dupont Marie", "Sexe": "F", "Date_Naissance": "02/03/2010"}],
//!     "E007": "iVBORw0KGgo..."
//!   },
//!   "time_taken": "120ms"
//! }
//! ```
//!
//! Unknown keys are ignored so newer firmware can add groups without
//! breaking older clients.

use crate::error::{DecodeError, Result};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

/// Envelope of one reader service message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCardMessage {
    /// Field groups read from the chip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CardResult>,

    /// Reader-reported duration of the chip read, free-form.
    ///
    /// Numeric values are kept in their JSON text form.
    #[serde(
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_taken: Option<String>,
}

/// Field groups of a card read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardResult {
    /// Positional personal, address, and document data.
    #[serde(rename = "E004", default, skip_serializing_if = "Option::is_none")]
    pub personal: Option<Vec<Option<String>>>,

    /// Family members registered on the card.
    #[serde(rename = "E006", default, skip_serializing_if = "Option::is_none")]
    pub family: Option<Vec<FamilyMember>>,

    /// Portrait, bare base64 or data URI.
    #[serde(rename = "E007", default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Family member entry, passed through to the profile untouched.
///
/// The three named keys read `null` as empty. Any other key is kept in
/// `extra` and written back out with the member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    #[serde(rename = "Nom", default, deserialize_with = "text_or_empty")]
    pub name: String,

    #[serde(rename = "Sexe", default, deserialize_with = "text_or_empty")]
    pub sex: String,

    #[serde(rename = "Date_Naissance", default, deserialize_with = "text_or_empty")]
    pub birth_date: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FamilyMember {
    /// One-letter sex marker used in compact listings.
    ///
    /// Anything other than `M` is shown as `F`, matching the member cards
    /// printed by the issuing office.
    pub fn sex_initial(&self) -> char {
        if self.sex == "M" { 'M' } else { 'F' }
    }
}

/// Scalar read as text. `null` is absent, numbers and booleans keep their
/// JSON spelling.
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(scalar.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "invalid type: expected a string or number, found {other}"
        ))),
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(deserializer).map(Option::unwrap_or_default)
}

impl RawCardMessage {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidJson`] if the frame is not JSON and
    /// [`DecodeError::Malformed`] if a known key holds a value of the wrong
    /// type (for example `E004` not being an array of strings).
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(DecodeError::from_json)
    }

    /// Parse an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the value does not have the
    /// envelope shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(DecodeError::from_json)
    }

    /// The positional array, checked for presence.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`] when `result` or `result.E004`
    /// is absent.
    pub fn personal(&self) -> Result<&[Option<String>]> {
        let result = self
            .result
            .as_ref()
            .ok_or(DecodeError::missing("result"))?;
        result
            .personal
            .as_deref()
            .ok_or(DecodeError::missing("result.E004"))
    }

    /// Family members, empty when the card has none.
    pub fn family(&self) -> &[FamilyMember] {
        self.result
            .as_ref()
            .and_then(|result| result.family.as_deref())
            .unwrap_or_default()
    }

    /// Raw avatar payload, if any.
    pub fn avatar(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|result| result.avatar.as_deref())
    }
}
