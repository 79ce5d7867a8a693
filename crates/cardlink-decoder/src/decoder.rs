//! Raw message to profile transformation.

use crate::avatar::normalize_avatar;
use crate::date::{calculate_age, format_date};
use crate::error::Result;
use crate::layout::{FIRMWARE_V1, FieldLayout, PersonalField};
use crate::message::RawCardMessage;
use crate::profile::{Profile, Sex};
use cardlink_core::constants::NOT_SPECIFIED;
use chrono::{Local, NaiveDate};
use tracing::{debug, trace};

/// Decoder bound to one firmware layout.
///
/// # Example
///
/// ```
/// use cardlink_decoder::{ProfileDecoder, RawCardMessage, Sex};
/// use chrono::NaiveDate;
///
/// let message = RawCardMessage::parse(r#"{"result":{"E004":["ID1","Dupont","Jean","","F"]}}"#).unwrap();
/// let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
///
/// let profile = ProfileDecoder::new().decode(&message, today).unwrap();
/// assert_eq!(profile.sex(), Sex::Female);
/// assert_eq!(profile.birth_date(), "Non spécifié");
/// assert_eq!(profile.elapsed(), "Non spécifié");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProfileDecoder {
    layout: FieldLayout,
}

impl Default for ProfileDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileDecoder {
    /// Decoder for the current firmware layout.
    pub fn new() -> Self {
        Self::with_layout(FIRMWARE_V1)
    }

    pub fn with_layout(layout: FieldLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Decode a parsed message, computing the age at `today`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`](crate::DecodeError::MissingField)
    /// if the message has no `result.E004` array. Missing or empty entries
    /// inside the array are not errors.
    pub fn decode(&self, message: &RawCardMessage, today: NaiveDate) -> Result<Profile> {
        let personal = message.personal()?;
        let field = |name: PersonalField| self.layout.get(name, personal);
        let text = |name: PersonalField| field(name).unwrap_or(NOT_SPECIFIED).to_string();

        if personal.len() < self.layout.span() {
            trace!(
                len = personal.len(),
                expected = self.layout.span(),
                "Short personal array, trailing fields use placeholders"
            );
        }

        let profile = Profile {
            id_number: text(PersonalField::Id),
            surname: text(PersonalField::Surname),
            given_name: text(PersonalField::GivenName),
            birth_date: format_date(field(PersonalField::BirthDate)),
            sex: Sex::from_code(field(PersonalField::Sex)),
            residence: text(PersonalField::Residence),
            city: text(PersonalField::City),
            country: text(PersonalField::Country),
            postal_code: text(PersonalField::PostalCode),
            issue_date: format_date(field(PersonalField::IssueDate)),
            document_number: text(PersonalField::DocumentNumber),
            district: text(PersonalField::District),
            municipality: text(PersonalField::Municipality),
            family: message.family().to_vec(),
            avatar: normalize_avatar(message.avatar()),
            age: calculate_age(field(PersonalField::BirthDate), today),
            elapsed: message
                .time_taken
                .as_deref()
                .filter(|elapsed| !elapsed.is_empty())
                .unwrap_or(NOT_SPECIFIED)
                .to_string(),
        };

        debug!(
            layout = self.layout.revision(),
            fields = personal.len(),
            family = profile.family.len(),
            has_avatar = profile.avatar.is_some(),
            "Decoded card profile"
        );

        Ok(profile)
    }

    /// Parse and decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns any [`DecodeError`](crate::DecodeError): invalid JSON, a
    /// malformed envelope, or a missing `E004` array.
    pub fn decode_str(&self, text: &str, today: NaiveDate) -> Result<Profile> {
        let message = RawCardMessage::parse(text)?;
        self.decode(&message, today)
    }

    /// Decode an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns a malformed envelope or missing `E004` error.
    pub fn decode_value(&self, value: serde_json::Value, today: NaiveDate) -> Result<Profile> {
        let message = RawCardMessage::from_value(value)?;
        self.decode(&message, today)
    }
}

/// Decode a text frame with the current layout and the local date.
///
/// # Errors
///
/// See [`ProfileDecoder::decode_str`].
pub fn decode_str(text: &str) -> Result<Profile> {
    ProfileDecoder::new().decode_str(text, Local::now().date_naive())
}

/// Decode a JSON value with the current layout and the local date.
///
/// # Errors
///
/// See [`ProfileDecoder::decode_value`].
pub fn decode_value(value: serde_json::Value) -> Result<Profile> {
    ProfileDecoder::new().decode_value(value, Local::now().date_naive())
}
