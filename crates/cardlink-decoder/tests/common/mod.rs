//! Common test utilities for decoder integration tests.
//!
//! Builders produce reader messages in the exact wire shape so tests read
//! like the frames the service pushes.

#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{Value, json};

/// Personal array of the reference Djibouti card, firmware V1 order.
pub const REFERENCE_PERSONAL: [&str; 16] = [
    "ID1",
    "Dupont",
    "Jean",
    "15/06/1985",
    "M",
    "",
    "CampX",
    "Djibouti",
    "Rep. Djibouti",
    "12345",
    "01/01/2020",
    "DOC123",
    "",
    "Arr1",
    "",
    "ComA",
];

/// Fixed reference date used by tests that assert exact ages.
pub fn reference_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

/// Message with the given personal array and nothing else.
pub fn personal_message(personal: &[&str]) -> Value {
    json!({ "result": { "E004": personal } })
}

/// Reference message as pushed by the service after a full chip read.
pub fn reference_message() -> Value {
    json!({
        "result": {
            "E004": REFERENCE_PERSONAL,
            "E006": [],
            "E007": null
        },
        "time_taken": "120ms"
    })
}

/// Expected age for a birth date at `today`, computed independently of the
/// decoder.
pub fn expected_age(birth: NaiveDate, today: NaiveDate) -> i32 {
    use chrono::Datelike;

    let before_birthday = (today.month(), today.day()) < (birth.month(), birth.day());
    today.year() - birth.year() - i32::from(before_birthday)
}
