//! Input validation utilities.
//!
//! Checks applied to user-supplied names before they are used to build file paths.

use crate::{KindlingError, KindlingResult};

const MAX_PERSONA_NAME_LEN: usize = 64;

/// Validates that a persona name is safe to join onto a persona directory.
///
/// Persona names become file stems (`{dir}/{name}.yaml`), so the name must not be able to
/// climb out of that directory or name a hidden file:
/// - rejects empty or whitespace-only names
/// - bounds the length
/// - restricts characters to ASCII alphanumerics, `-` and `_`
///
/// # Errors
///
/// Returns [`KindlingError::Configuration`] if the name is invalid.
pub fn validate_persona_name(name: &str) -> KindlingResult<()> {
    if name.trim().is_empty() {
        return Err(KindlingError::Configuration(
            "persona name cannot be empty".into(),
        ));
    }

    if name.len() > MAX_PERSONA_NAME_LEN {
        return Err(KindlingError::Configuration(format!(
            "persona name exceeds maximum length of {MAX_PERSONA_NAME_LEN} characters"
        )));
    }

    let ok = name
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_'));

    if !ok {
        return Err(KindlingError::Configuration(format!(
            "persona name '{name}' contains invalid characters (only alphanumeric, '-', '_' allowed)"
        )));
    }

    Ok(())
}
