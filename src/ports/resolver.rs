//! Binary resolver port for locating executables.

use super::process::{BoxError, ExecFuture};

/// Locates an executable by name.
///
/// Resolution is best effort: callers treat both `Ok(None)` and `Err(_)`
/// as "no resolution" and fall back to PATH lookup at launch time.
pub trait BinaryResolver: Send + Sync {
    /// Returns the absolute path of `name`, if it can be found.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself failed.
    fn resolve<'a>(&'a self, name: &'a str) -> ExecFuture<'a, Result<Option<String>, BoxError>>;
}
