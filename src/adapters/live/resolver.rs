//! Live binary resolver backed by `PATH` lookup.

use crate::ports::{BinaryResolver, BoxError, ExecFuture};

/// Resolves executables with the `which` crate.
pub struct LiveBinaryResolver;

impl BinaryResolver for LiveBinaryResolver {
    fn resolve<'a>(&'a self, name: &'a str) -> ExecFuture<'a, Result<Option<String>, BoxError>> {
        Box::pin(async move {
            match which::which(name) {
                Ok(path) => Ok(Some(path.to_string_lossy().into_owned())),
                Err(which::Error::CannotFindBinaryPath) => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
    }
}
