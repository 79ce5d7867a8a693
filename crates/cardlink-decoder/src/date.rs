//! Date display and age derivation.
//!
//! Cards carry dates in two shapes:
//!
//! - `DD/MM/YYYY`, already suitable for display;
//! - a fixed-width raw form where day and month sit at `[0..2)` and `[3..5)`
//!   and the year is split across `[6..8)` and `[9..11)`, for example
//!   `15-06-19-85` for 15 June 1985.
//!
//! The split year is reproduced exactly as the readers emit it. Neither
//! function validates that the result is a real calendar date: a wrong date
//! is still better than an empty field on the operator screen.

use cardlink_core::constants::{MAX_PLAUSIBLE_AGE, NOT_COMPUTABLE, NOT_SPECIFIED};
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Serialize, Serializer};
use std::fmt;

/// Minimum length (in characters) of a raw fixed-width date.
const RAW_DATE_MIN_LEN: usize = 8;

/// Age derived from a birth date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Age {
    /// Completed years at the reference date. Not range checked.
    Years(i32),

    /// Birth date absent or unreadable.
    NotComputable,
}

impl Age {
    /// Years, when computable.
    pub fn years(&self) -> Option<i32> {
        match self {
            Age::Years(years) => Some(*years),
            Age::NotComputable => None,
        }
    }

    /// Whether the age is in `0..=150`.
    ///
    /// Implausible ages are still displayed; this flag lets a consumer mark
    /// them.
    pub fn is_plausible(&self) -> bool {
        matches!(self, Age::Years(years) if (0..=MAX_PLAUSIBLE_AGE).contains(years))
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Years(years) => write!(f, "{years}"),
            Age::NotComputable => f.write_str(NOT_COMPUTABLE),
        }
    }
}

impl Serialize for Age {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Age::Years(years) => serializer.serialize_i32(*years),
            Age::NotComputable => serializer.serialize_str(NOT_COMPUTABLE),
        }
    }
}

/// Format a card date for display.
///
/// - absent or empty: `"Non spécifié"`
/// - contains `/`: returned unchanged
/// - at least 8 characters: rebuilt as `DD/MM/YYYY` from the split-year form
/// - anything else: returned unchanged
///
/// The function is idempotent.
///
/// # Examples
///
/// ```
/// use cardlink_decoder::format_date;
///
/// assert_eq!(format_date(Some("01/02/1990")), "01/02/1990");
/// assert_eq!(format_date(Some("01-02-19-90")), "01/02/1990");
/// assert_eq!(format_date(Some("1990")), "1990");
/// assert_eq!(format_date(None), "Non spécifié");
/// ```
pub fn format_date(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return NOT_SPECIFIED.to_string(),
    };

    if raw == NOT_SPECIFIED || raw.contains('/') {
        return raw.to_string();
    }

    if raw.chars().count() >= RAW_DATE_MIN_LEN {
        let (day, month, year) = split_raw(raw);
        return format!("{day}/{month}/{year}");
    }

    raw.to_string()
}

/// Compute the age in completed years at `today`.
///
/// Slash dates are split positionally into day, month, and year; raw dates
/// use the same slices as [`format_date`]. Each component is read as a
/// leading integer (`"07abc"` reads as 7). Years `0..=99` are read as
/// `1900..=1999`. Out-of-range days and months roll over into the adjacent
/// month or year instead of failing.
///
/// # Examples
///
/// ```
/// use cardlink_decoder::{Age, calculate_age};
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
/// assert_eq!(calculate_age(Some("15/06/1985"), today), Age::Years(39));
/// assert_eq!(calculate_age(Some("14/06/1985"), today), Age::Years(40));
/// assert_eq!(calculate_age(Some("1985"), today), Age::NotComputable);
/// ```
pub fn calculate_age(raw: Option<&str>, today: NaiveDate) -> Age {
    match birth_date(raw) {
        Some(birth) => Age::Years(age_at(birth, today)),
        None => Age::NotComputable,
    }
}

/// Completed years between `birth` and `today`.
fn age_at(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Parse a card birth date into a calendar date.
fn birth_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.filter(|raw| !raw.is_empty())?;

    let (day, month, year) = if raw.contains('/') {
        let mut parts = raw.split('/');
        (
            leading_int(parts.next()?)?,
            leading_int(parts.next()?)?,
            leading_int(parts.next()?)?,
        )
    } else if raw.chars().count() >= RAW_DATE_MIN_LEN {
        let (day, month, year) = split_raw(raw);
        (leading_int(&day)?, leading_int(&month)?, leading_int(&year)?)
    } else {
        return None;
    };

    rolled_date(year, month, day)
}

/// Slice a raw fixed-width date into day, month, and split year.
fn split_raw(raw: &str) -> (String, String, String) {
    let day = slice_chars(raw, 0, 2);
    let month = slice_chars(raw, 3, 5);
    let year = slice_chars(raw, 6, 8) + &slice_chars(raw, 9, 11);
    (day, month, year)
}

/// Characters `[start..end)` of `s`, clamped to its length.
fn slice_chars(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Read the integer prefix of `s`.
///
/// Leading whitespace and one sign are accepted; parsing stops at the first
/// non-digit. Returns `None` when no digit is found.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;

    Some(if negative { -value } else { value })
}

/// Build a date from possibly out-of-range components.
///
/// Month 13 is January of the next year, day 0 is the last day of the
/// previous month, and so on.
fn rolled_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let year = if (0..=99).contains(&year) {
        1900 + year
    } else {
        year
    };

    let total_months = year.checked_mul(12)?.checked_add(month.checked_sub(1)?)?;
    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month = u32::try_from(total_months.rem_euclid(12) + 1).ok()?;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(TimeDelta::try_days(day.checked_sub(1)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(Some("01/02/1990"), "01/02/1990")]
    #[case(Some("1/2/90"), "1/2/90")]
    #[case(Some("01-02-19-90"), "01/02/1990")]
    #[case(Some("15.06.19.85"), "15/06/1985")]
    #[case(Some("15061985"), "15/61/85")]
    #[case(Some("2020"), "2020")]
    #[case(Some(""), "Non spécifié")]
    #[case(None, "Non spécifié")]
    fn test_format_date(#[case] raw: Option<&str>, #[case] expected: &str) {
        assert_eq!(format_date(raw), expected);
    }

    #[test]
    fn test_format_date_placeholder_is_stable() {
        let once = format_date(None);
        assert_eq!(format_date(Some(&once)), once);
    }

    #[test]
    fn test_format_date_non_ascii() {
        // Slices count characters, not bytes.
        assert_eq!(format_date(Some("é1-02-19-90")), "é1/02/1990");
    }

    #[rstest]
    #[case("7", Some(7))]
    #[case("07abc", Some(7))]
    #[case("  12", Some(12))]
    #[case("-3", Some(-3))]
    #[case("+4", Some(4))]
    #[case("", None)]
    #[case("ab", None)]
    #[case("-", None)]
    fn test_leading_int(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(leading_int(input), expected);
    }

    #[rstest]
    #[case(1985, 6, 15, date(1985, 6, 15))]
    #[case(85, 6, 15, date(1985, 6, 15))]
    #[case(2001, 13, 1, date(2002, 1, 1))]
    #[case(2001, 0, 1, date(2000, 12, 1))]
    #[case(2001, 3, 0, date(2001, 2, 28))]
    #[case(2000, 2, 30, date(2000, 3, 1))]
    fn test_rolled_date(
        #[case] year: i64,
        #[case] month: i64,
        #[case] day: i64,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(rolled_date(year, month, day), Some(expected));
    }

    #[test]
    fn test_age_on_anniversary() {
        let today = date(2025, 6, 15);
        assert_eq!(calculate_age(Some("15/06/1985"), today), Age::Years(40));
    }

    #[test]
    fn test_age_day_before_anniversary() {
        let today = date(2025, 6, 15);
        assert_eq!(calculate_age(Some("16/06/1985"), today), Age::Years(39));
    }

    #[test]
    fn test_age_later_month() {
        let today = date(2025, 6, 15);
        assert_eq!(calculate_age(Some("01/07/1985"), today), Age::Years(39));
        assert_eq!(calculate_age(Some("30/05/1985"), today), Age::Years(40));
    }

    #[test]
    fn test_age_raw_split_year() {
        let today = date(2025, 6, 15);
        assert_eq!(calculate_age(Some("15-06-19-85"), today), Age::Years(40));
    }

    #[test]
    fn test_age_leap_day_birth() {
        // A 29/02 birthday is reached on 01/03 in non-leap years.
        assert_eq!(
            calculate_age(Some("29/02/2000"), date(2025, 2, 28)),
            Age::Years(24)
        );
        assert_eq!(
            calculate_age(Some("29/02/2000"), date(2025, 3, 1)),
            Age::Years(25)
        );
    }

    #[test]
    fn test_age_two_digit_year() {
        assert_eq!(
            calculate_age(Some("15/06/85"), date(2025, 6, 15)),
            Age::Years(40)
        );
    }

    #[test]
    fn test_age_future_birth_is_negative() {
        assert_eq!(
            calculate_age(Some("01/01/2030"), date(2025, 6, 15)),
            Age::Years(-5)
        );
        assert!(!Age::Years(-5).is_plausible());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("1985"))]
    #[case(Some("15/06"))]
    #[case(Some("aa/bb/cccc"))]
    #[case(Some("unknown date"))]
    fn test_age_not_computable(#[case] raw: Option<&str>) {
        assert_eq!(calculate_age(raw, date(2025, 6, 15)), Age::NotComputable);
    }

    #[test]
    fn test_age_display_and_serialize() {
        assert_eq!(Age::Years(40).to_string(), "40");
        assert_eq!(Age::NotComputable.to_string(), "Non calculé");
        assert_eq!(serde_json::to_string(&Age::Years(40)).unwrap(), "40");
        assert_eq!(
            serde_json::to_string(&Age::NotComputable).unwrap(),
            "\"Non calculé\""
        );
    }

    #[test]
    fn test_age_plausibility() {
        assert!(Age::Years(0).is_plausible());
        assert!(Age::Years(150).is_plausible());
        assert!(!Age::Years(151).is_plausible());
        assert!(!Age::NotComputable.is_plausible());
        assert_eq!(Age::NotComputable.years(), None);
    }
}
