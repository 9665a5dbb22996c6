//! Replaying adapter for the `BinaryResolver` port.

use std::sync::{Arc, Mutex};

use super::replay_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{BinaryResolver, BoxError, ExecFuture};

/// Serves recorded lookups.
pub struct ReplayingBinaryResolver {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingBinaryResolver {
    /// Creates a resolver reading from `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl BinaryResolver for ReplayingBinaryResolver {
    fn resolve<'a>(
        &'a self,
        _name: &'a str,
    ) -> ExecFuture<'a, Result<Option<String>, BoxError>> {
        let result = replay_result(&self.replayer, "resolver", "resolve");
        Box::pin(async move { result })
    }
}
