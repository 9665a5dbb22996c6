//! Recording session writing one cassette per CLI invocation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// File name of the cassette inside a session directory.
pub const SESSION_CASSETTE: &str = "session.cassette.yaml";

/// A recorder shared by every recording adapter of one invocation.
///
/// Cassettes are written to `<base>/<timestamp>/session.cassette.yaml`.
pub struct RecordingSession {
    /// Recorder shared with the recording adapters.
    pub recorder: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Creates a timestamped directory under `base` for this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let recorder = CassetteRecorder::new(output_dir.join(SESSION_CASSETTE), timestamp);
        Ok(Self {
            recorder: Arc::new(Mutex::new(recorder)),
            output_dir,
        })
    }

    /// Directory the cassette is written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the cassette and returns the session directory.
    ///
    /// All adapters holding the recorder must have been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorder is still shared or the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapters still hold the recorder".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))?;
        Ok(self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_creates_directory_and_writes_cassette() {
        let base = tempfile::tempdir().unwrap();
        let session = RecordingSession::new(base.path()).unwrap();
        assert!(session.output_dir().exists());

        let dir = session.finish().unwrap();
        assert!(dir.join(SESSION_CASSETTE).exists());
    }

    #[test]
    fn finish_fails_while_recorder_is_shared() {
        let base = tempfile::tempdir().unwrap();
        let session = RecordingSession::new(base.path()).unwrap();
        let _held = Arc::clone(&session.recorder);
        assert!(session.finish().is_err());
    }
}
