//! Parameter and field name validation.

use regex::Regex;
use std::sync::LazyLock;

// ASCII word characters only, matched against the whole name
static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-.]+$").expect("valid name pattern"));

/// Whether `name` is worth recording as a parameter name.
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && VALID_NAME.is_match(name)
}

/// Normalize an already-decoded parameter name.
///
/// Trims, strips `?`, and turns a lone `_` (cache-buster) into nothing.
/// Returns `None` when the result is not a valid name.
pub fn normalize_param_name(decoded: &str) -> Option<String> {
    let name = decoded.trim().replace('?', "");
    if name == "_" {
        return None;
    }
    is_valid_name(&name).then_some(name)
}
