//! Classification of launch errors.
//!
//! The only place that knows which message fragments mean "the executable
//! is not there". Call sites go through [`is_not_found`].

use crate::ports::BoxError;

/// Lowercase message fragments that mark an executable as missing.
///
/// `does not exist` also matches unrelated file errors; it is kept because
/// launchers on some platforms report missing binaries that way.
pub const NOT_FOUND_MARKERS: [&str; 3] = ["not found", "does not exist", "cannot find"];

/// Returns `true` if `message` reports a missing executable.
#[must_use]
pub fn is_not_found_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Returns `true` if `error` reports a missing executable.
#[must_use]
pub fn is_not_found(error: &BoxError) -> bool {
    is_not_found_message(&error.to_string())
}
