//! Recording adapter for the `BinaryResolver` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{BinaryResolver, BoxError, ExecFuture};

#[derive(Serialize)]
struct NameInput<'a> {
    name: &'a str,
}

/// Records lookups while delegating to an inner resolver.
pub struct RecordingBinaryResolver {
    inner: Arc<dyn BinaryResolver>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingBinaryResolver {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Arc<dyn BinaryResolver>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl BinaryResolver for RecordingBinaryResolver {
    fn resolve<'a>(&'a self, name: &'a str) -> ExecFuture<'a, Result<Option<String>, BoxError>> {
        Box::pin(async move {
            let result = self.inner.resolve(name).await;
            record_result(&self.recorder, "resolver", "resolve", &NameInput { name }, &result);
            result
        })
    }
}
