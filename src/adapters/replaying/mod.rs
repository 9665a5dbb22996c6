//! Replaying adapters that serve recorded interactions.

pub mod process;
pub mod resolver;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::BoxError;

pub use process::ReplayingProcessExecutor;
pub use resolver::ReplayingBinaryResolver;

/// Reads the next `{"ok": ...}` / `{"err": "..."}` interaction for `port::method`.
///
/// An exhausted cassette or an undecodable value is returned as an error too.
pub(crate) fn replay_result<T: DeserializeOwned>(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> Result<T, BoxError> {
    let output = {
        let mut replayer = replayer.lock().expect("replayer lock poisoned");
        replayer.next_interaction(port, method)?.output.clone()
    };
    if let Some(err) = output.get("err") {
        return Err(err.as_str().unwrap_or("unknown error").to_string().into());
    }
    let value = output.get("ok").cloned().unwrap_or(output);
    serde_json::from_value(value)
        .map_err(|e| format!("{port}::{method}: failed to decode recorded value: {e}").into())
}
