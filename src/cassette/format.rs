//! Cassette data structures for recorded process interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single call made through a port, with what it returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name (`process` or `resolver`).
    pub port: String,
    /// Method invoked on the port (`execute`, `spawn`, `resolve`).
    pub method: String,
    /// Arguments of the call.
    pub input: serde_json::Value,
    /// Result of the call, as `{"ok": ...}` or `{"err": "..."}`.
    pub output: serde_json::Value,
}

/// A named, ordered set of interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Operating system the recording was made on.
    pub platform: String,
    /// Interactions in recording order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Reads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a cassette.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }
}
