//! Custom share alias ("domain") normalization.
//!
//! An alias lets a public link read `/share/my-dinos` instead of
//! `/share/<user id>`. Aliases are unique across users and a user has at
//! most one.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Characters outside this class are stripped from an alias.
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("valid regex"));

/// Lowercase, trim and strip everything but `a-z`, `0-9` and `-`.
///
/// Returns a validation error when nothing usable remains.
pub fn normalize_alias(raw: &str) -> Result<String, CoreError> {
    let lowered = raw.trim().to_lowercase();
    let cleaned = DISALLOWED_RE.replace_all(&lowered, "").into_owned();
    if cleaned.is_empty() {
        return Err(CoreError::Validation(
            "Please enter a valid domain name".to_string(),
        ));
    }
    Ok(cleaned)
}
