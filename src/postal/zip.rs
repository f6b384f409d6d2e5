//! ZIP code normalization.

use regex::Regex;
use std::sync::LazyLock;

/// Optional leading state token, five digits, optional `-####` extension
static ZIP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[^0-9\s]+\s+)?([0-9]{5})(?:-[0-9]+)?$").unwrap());

/// Extract the 5-digit ZIP from a free-form address field.
///
/// Accepts `"18964"`, `"94610-2737"` and `"CA 94610-2737"`. Returns `None`
/// when no 5-digit code can be found; that is the normal case for records
/// without postal addressing.
pub fn normalize_zip(raw: &str) -> Option<String> {
    ZIP_REGEX
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
