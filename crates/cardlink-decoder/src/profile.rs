//! Decoded identity profile.
//!
//! A [`Profile`] is the UI-ready form of one card read. Every text field is
//! populated, either with the card value or with the `"Non spécifié"`
//! placeholder, so consumers never branch on missing data. Profiles are
//! built only by the decoder and are read-only afterwards; a new read
//! produces a new profile.
//!
//! The JSON form keeps the field names the operator front-end already
//! consumes (`numeroId`, `nom`, `prenom`, ...).

use crate::date::Age;
use crate::message::FamilyMember;
use cardlink_core::constants::{NOT_SPECIFIED, SEX_FEMALE_LABEL, SEX_MALE_LABEL};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Holder sex, decoded from the one-letter card code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
    Unspecified,
}

impl Sex {
    /// Decode a card sex code. Only `M` and `F` are recognized.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("M") => Sex::Male,
            Some("F") => Sex::Female,
            _ => Sex::Unspecified,
        }
    }

    /// Localized label shown to operators.
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => SEX_MALE_LABEL,
            Sex::Female => SEX_FEMALE_LABEL,
            Sex::Unspecified => NOT_SPECIFIED,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Sex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Identity record decoded from one card read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    #[serde(rename = "numeroId")]
    pub(crate) id_number: String,

    #[serde(rename = "nom")]
    pub(crate) surname: String,

    #[serde(rename = "prenom")]
    pub(crate) given_name: String,

    #[serde(rename = "dateNaissance")]
    pub(crate) birth_date: String,

    #[serde(rename = "sexe")]
    pub(crate) sex: Sex,

    #[serde(rename = "camp")]
    pub(crate) residence: String,

    #[serde(rename = "ville")]
    pub(crate) city: String,

    #[serde(rename = "pays")]
    pub(crate) country: String,

    #[serde(rename = "codePostal")]
    pub(crate) postal_code: String,

    #[serde(rename = "dateEmission")]
    pub(crate) issue_date: String,

    #[serde(rename = "numeroDocument")]
    pub(crate) document_number: String,

    #[serde(rename = "arrondissement")]
    pub(crate) district: String,

    #[serde(rename = "commune")]
    pub(crate) municipality: String,

    #[serde(rename = "famille")]
    pub(crate) family: Vec<FamilyMember>,

    #[serde(rename = "avatar")]
    pub(crate) avatar: Option<String>,

    #[serde(rename = "age")]
    pub(crate) age: Age,

    #[serde(rename = "tempsDeTravail")]
    pub(crate) elapsed: String,
}

impl Profile {
    pub fn id_number(&self) -> &str {
        &self.id_number
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    /// Display name, surname first as printed on the card.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.given_name)
    }

    /// Birth date, display formatted.
    pub fn birth_date(&self) -> &str {
        &self.birth_date
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// Residence, usually a camp name.
    pub fn residence(&self) -> &str {
        &self.residence
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Country exactly as read from the card.
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Country for display.
    ///
    /// Some readers emit the accented `é` of "Rép." as a replacement
    /// character; the first occurrence is restored.
    pub fn country_display(&self) -> Cow<'_, str> {
        if self.country.contains('\u{FFFD}') {
            Cow::Owned(self.country.replacen('\u{FFFD}', "é", 1))
        } else {
            Cow::Borrowed(&self.country)
        }
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    /// Document issue date, display formatted.
    pub fn issue_date(&self) -> &str {
        &self.issue_date
    }

    pub fn document_number(&self) -> &str {
        &self.document_number
    }

    pub fn district(&self) -> &str {
        &self.district
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn family(&self) -> &[FamilyMember] {
        &self.family
    }

    /// Portrait as a data URI, `None` when the card has none.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn age(&self) -> Age {
        self.age
    }

    /// Reader-reported read duration, or the placeholder.
    pub fn elapsed(&self) -> &str {
        &self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Profile {
        Profile {
            id_number: "ID1".to_string(),
            surname: "Dupont".to_string(),
            given_name: "Jean".to_string(),
            birth_date: "15/06/1985".to_string(),
            sex: Sex::Male,
            residence: "CampX".to_string(),
            city: "Djibouti".to_string(),
            country: "R\u{FFFD}p. Djibouti".to_string(),
            postal_code: "12345".to_string(),
            issue_date: "01/01/2020".to_string(),
            document_number: "DOC123".to_string(),
            district: "Arr1".to_string(),
            municipality: "ComA".to_string(),
            family: Vec::new(),
            avatar: None,
            age: Age::Years(40),
            elapsed: "120ms".to_string(),
        }
    }

    #[rstest]
    #[case(Some("M"), Sex::Male, "Masculin")]
    #[case(Some("F"), Sex::Female, "Féminin")]
    #[case(Some("m"), Sex::Unspecified, "Non spécifié")]
    #[case(Some("X"), Sex::Unspecified, "Non spécifié")]
    #[case(None, Sex::Unspecified, "Non spécifié")]
    fn test_sex_from_code(#[case] code: Option<&str>, #[case] sex: Sex, #[case] label: &str) {
        assert_eq!(Sex::from_code(code), sex);
        assert_eq!(sex.label(), label);
    }

    #[test]
    fn test_country_display_repairs_first_replacement() {
        let profile = sample();
        assert_eq!(profile.country_display(), "Rép. Djibouti");
        assert_eq!(profile.country(), "R\u{FFFD}p. Djibouti");
    }

    #[test]
    fn test_country_display_borrowed_when_clean() {
        let mut profile = sample();
        profile.country = "Djibouti".to_string();
        assert!(matches!(profile.country_display(), Cow::Borrowed("Djibouti")));
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["numeroId"], "ID1");
        assert_eq!(json["nom"], "Dupont");
        assert_eq!(json["prenom"], "Jean");
        assert_eq!(json["dateNaissance"], "15/06/1985");
        assert_eq!(json["sexe"], "Masculin");
        assert_eq!(json["camp"], "CampX");
        assert_eq!(json["codePostal"], "12345");
        assert_eq!(json["dateEmission"], "01/01/2020");
        assert_eq!(json["numeroDocument"], "DOC123");
        assert_eq!(json["arrondissement"], "Arr1");
        assert_eq!(json["commune"], "ComA");
        assert_eq!(json["famille"], serde_json::json!([]));
        assert!(json["avatar"].is_null());
        assert_eq!(json["age"], 40);
        assert_eq!(json["tempsDeTravail"], "120ms");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(sample().full_name(), "Dupont Jean");
    }
}
