//! Portrait normalization.

use cardlink_core::constants::{DATA_URI_MARKER, PNG_DATA_URI_PREFIX};

/// Normalize the `E007` portrait into a data URI.
///
/// Payloads already wrapped as a data URI are kept as is; bare base64 is
/// wrapped as PNG. Absent or empty payloads yield `None` and the consumer
/// shows its placeholder.
///
/// # Examples
///
/// ```
/// use cardlink_decoder::normalize_avatar;
///
/// assert_eq!(
///     normalize_avatar(Some("iVBORw0KGgo")).as_deref(),
///     Some("data:image/png;base64,iVBORw0KGgo")
/// );
/// assert_eq!(normalize_avatar(None), None);
/// ```
pub fn normalize_avatar(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|raw| !raw.is_empty())?;

    if raw.starts_with(DATA_URI_MARKER) {
        Some(raw.to_string())
    } else {
        Some(format!("{PNG_DATA_URI_PREFIX}{raw}"))
    }
}
