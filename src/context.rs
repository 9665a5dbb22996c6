//! Service context bundling the process and resolver ports.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::{LiveBinaryResolver, LiveProcessExecutor, LiveProgressExecutor};
use crate::adapters::recording::process::{RecordingProcessExecutor, RecordingProgressExecutor};
use crate::adapters::recording::resolver::RecordingBinaryResolver;
use crate::adapters::replaying::process::ReplayingProcessExecutor;
use crate::adapters::replaying::resolver::ReplayingBinaryResolver;
use crate::adapters::scripted::ScriptedExecutor;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::ports::{BinaryResolver, ProcessExecutor, ProgressProcessExecutor};

/// Whether this platform ships the PowerShell fallback.
#[must_use]
pub fn platform_has_shell_fallback() -> bool {
    cfg!(windows)
}

/// Bundles the port trait objects the extension's commands run against.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying, scripted).
pub struct ServiceContext {
    /// Runs a process to completion.
    pub process: Arc<dyn ProcessExecutor>,
    /// Spawns a process that reports activity and can be cancelled.
    pub progress_process: Arc<dyn ProgressProcessExecutor>,
    /// Looks runtime binaries up on `PATH`.
    pub resolver: Arc<dyn BinaryResolver>,
    /// Platform flag gating the PowerShell fallback.
    pub shell_fallback: bool,
}

impl ServiceContext {
    /// Creates a context that launches real processes.
    #[must_use]
    pub fn live() -> Self {
        Self {
            process: Arc::new(LiveProcessExecutor),
            progress_process: Arc::new(LiveProgressExecutor::new()),
            resolver: Arc::new(LiveBinaryResolver),
            shell_fallback: platform_has_shell_fallback(),
        }
    }

    /// Creates a live context whose interactions are recorded into `session`.
    #[must_use]
    pub fn recording(session: &RecordingSession) -> Self {
        let live = Self::live();
        Self {
            process: Arc::new(RecordingProcessExecutor::new(
                live.process,
                Arc::clone(&session.recorder),
            )),
            progress_process: Arc::new(RecordingProgressExecutor::new(
                live.progress_process,
                Arc::clone(&session.recorder),
            )),
            resolver: Arc::new(RecordingBinaryResolver::new(
                live.resolver,
                Arc::clone(&session.recorder),
            )),
            shell_fallback: live.shell_fallback,
        }
    }

    /// Starts a recording session under `base` and a context recording into it.
    ///
    /// The context must be dropped before the session is finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(base: &Path) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base)?;
        Ok((Self::recording(&session), session))
    }

    /// Creates a context that serves every interaction from a cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        tracing::debug!(
            cassette = %cassette.name,
            interactions = cassette.interactions.len(),
            "replaying cassette"
        );
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        let executor = Arc::new(ReplayingProcessExecutor::new(Arc::clone(&replayer)));
        Ok(Self {
            process: Arc::clone(&executor) as Arc<dyn ProcessExecutor>,
            progress_process: executor,
            resolver: Arc::new(ReplayingBinaryResolver::new(replayer)),
            shell_fallback: platform_has_shell_fallback(),
        })
    }

    /// Creates a context where `executor` plays every port.
    ///
    /// The shell fallback starts disabled.
    #[must_use]
    pub fn scripted(executor: Arc<ScriptedExecutor>) -> Self {
        Self {
            process: Arc::clone(&executor) as Arc<dyn ProcessExecutor>,
            progress_process: Arc::clone(&executor) as Arc<dyn ProgressProcessExecutor>,
            resolver: executor,
            shell_fallback: false,
        }
    }

    /// Overrides the platform flag gating the PowerShell fallback.
    #[must_use]
    pub fn with_shell_fallback(mut self, enabled: bool) -> Self {
        self.shell_fallback = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cassette::recorder::CassetteRecorder;
    use crate::ports::ExecutionResult;

    #[test]
    fn live_context_follows_platform_flag() {
        assert_eq!(ServiceContext::live().shell_fallback, platform_has_shell_fallback());
        assert!(ServiceContext::live().with_shell_fallback(true).shell_fallback);
    }

    #[tokio::test]
    async fn replaying_context_serves_all_ports() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = CassetteRecorder::new(dir.path().join("c.cassette.yaml"), "test");
        recorder.record(
            "resolver",
            "resolve",
            json!({"name": "node"}),
            json!({"ok": "/usr/bin/node"}),
        );
        recorder.record(
            "process",
            "execute",
            json!({"command": "/usr/bin/node", "args": ["--version"]}),
            json!({"ok": {"exit_code": 0, "stdout": "v20.11.0\n", "stderr": ""}}),
        );
        let path = recorder.finish().unwrap();

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(
            ctx.resolver.resolve("node").await.unwrap().as_deref(),
            Some("/usr/bin/node")
        );
        let result = ctx
            .process
            .execute("/usr/bin/node", &["--version".into()])
            .await
            .unwrap();
        assert_eq!(
            result,
            ExecutionResult {
                exit_code: 0,
                stdout: "v20.11.0\n".into(),
                stderr: String::new(),
            }
        );
    }

    #[test]
    fn replaying_missing_cassette_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServiceContext::replaying(&dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn recording_session_finishes_once_context_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, session) = ServiceContext::recording_at(dir.path()).unwrap();
        drop(ctx);
        assert!(session.finish().is_ok());
    }
}
