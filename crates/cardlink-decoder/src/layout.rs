//! Positional layout of the `E004` personal data array.
//!
//! The reader firmware sends identity, address, and document data as a flat
//! array of strings where only the position identifies the meaning of each
//! entry. There is no schema negotiation with the device, so the mapping
//! lives here as data: supporting a new firmware revision means adding one
//! [`FieldLayout`] constant.
//!
//! # Firmware V1
//!
//! | Index | Field |
//! |-------|-------|
//! | 0 | identifier |
//! | 1 | surname |
//! | 2 | given name |
//! | 3 | birth date |
//! | 4 | sex code |
//! | 5 | reserved |
//! | 6 | residence (camp) |
//! | 7 | city |
//! | 8 | country |
//! | 9 | postal code |
//! | 10 | issue date |
//! | 11 | document number |
//! | 12 | reserved |
//! | 13 | district |
//! | 14 | reserved |
//! | 15 | municipality |

use std::fmt;

/// Named entry of the `E004` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonalField {
    Id,
    Surname,
    GivenName,
    BirthDate,
    Sex,
    Residence,
    City,
    Country,
    PostalCode,
    IssueDate,
    DocumentNumber,
    District,
    Municipality,
}

impl PersonalField {
    /// Every field, in firmware V1 index order.
    pub const ALL: [PersonalField; 13] = [
        PersonalField::Id,
        PersonalField::Surname,
        PersonalField::GivenName,
        PersonalField::BirthDate,
        PersonalField::Sex,
        PersonalField::Residence,
        PersonalField::City,
        PersonalField::Country,
        PersonalField::PostalCode,
        PersonalField::IssueDate,
        PersonalField::DocumentNumber,
        PersonalField::District,
        PersonalField::Municipality,
    ];
}

impl fmt::Display for PersonalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersonalField::Id => "id",
            PersonalField::Surname => "surname",
            PersonalField::GivenName => "given_name",
            PersonalField::BirthDate => "birth_date",
            PersonalField::Sex => "sex",
            PersonalField::Residence => "residence",
            PersonalField::City => "city",
            PersonalField::Country => "country",
            PersonalField::PostalCode => "postal_code",
            PersonalField::IssueDate => "issue_date",
            PersonalField::DocumentNumber => "document_number",
            PersonalField::District => "district",
            PersonalField::Municipality => "municipality",
        };
        f.write_str(name)
    }
}

/// Mapping from [`PersonalField`] to its index in `E004`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    revision: &'static str,
    entries: &'static [(PersonalField, usize)],
    reserved: &'static [usize],
}

/// Layout emitted by the first generation of reader firmware.
pub const FIRMWARE_V1: FieldLayout = FieldLayout {
    revision: "v1",
    entries: &[
        (PersonalField::Id, 0),
        (PersonalField::Surname, 1),
        (PersonalField::GivenName, 2),
        (PersonalField::BirthDate, 3),
        (PersonalField::Sex, 4),
        (PersonalField::Residence, 6),
        (PersonalField::City, 7),
        (PersonalField::Country, 8),
        (PersonalField::PostalCode, 9),
        (PersonalField::IssueDate, 10),
        (PersonalField::DocumentNumber, 11),
        (PersonalField::District, 13),
        (PersonalField::Municipality, 15),
    ],
    reserved: &[5, 12, 14],
};

impl FieldLayout {
    /// Firmware revision this layout matches.
    pub fn revision(&self) -> &'static str {
        self.revision
    }

    /// Index of `field`, or `None` if this revision does not carry it.
    pub fn index_of(&self, field: PersonalField) -> Option<usize> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, index)| *index)
    }

    /// Indices present in the array but not mapped to any field.
    pub fn reserved(&self) -> &'static [usize] {
        self.reserved
    }

    /// Minimum array length carrying every mapped field.
    pub fn span(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, index)| index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Value of `field` in `values`.
    ///
    /// Returns `None` when the index is out of range, the entry is `null`, or
    /// the entry is an empty string.
    pub fn get<'a>(&self, field: PersonalField, values: &'a [Option<String>]) -> Option<&'a str> {
        let index = self.index_of(field)?;
        values
            .get(index)?
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}
