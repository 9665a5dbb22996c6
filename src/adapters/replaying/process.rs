//! Replaying adapter for the process ports.

use std::sync::{Arc, Mutex};

use super::replay_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{
    BoxError, ExecFuture, ExecutionResult, ProcessEvent, ProcessExecutor, ProgressProcessExecutor,
    RunningProcess,
};

/// Serves recorded process outcomes instead of launching anything.
pub struct ReplayingProcessExecutor {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingProcessExecutor {
    /// Creates an executor reading from `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ProcessExecutor for ReplayingProcessExecutor {
    fn execute<'a>(
        &'a self,
        _command: &'a str,
        _args: &'a [String],
    ) -> ExecFuture<'a, Result<ExecutionResult, BoxError>> {
        let result = replay_result(&self.replayer, "process", "execute");
        Box::pin(async move { result })
    }
}

impl ProgressProcessExecutor for ReplayingProcessExecutor {
    fn spawn(
        &self,
        _command: &str,
        _args: &[String],
    ) -> Result<Box<dyn RunningProcess>, BoxError> {
        let result = replay_result(&self.replayer, "process", "spawn")?;
        Ok(Box::new(ReplayedProcess {
            result: Some(result),
        }))
    }
}

/// A process that has already exited with a recorded result.
struct ReplayedProcess {
    result: Option<ExecutionResult>,
}

impl RunningProcess for ReplayedProcess {
    fn next_event(&mut self) -> ExecFuture<'_, ProcessEvent> {
        let result = self
            .result
            .take()
            .ok_or_else(|| BoxError::from("replayed process already exited"));
        Box::pin(async move { ProcessEvent::Exited(result) })
    }

    fn cancel(&mut self) -> ExecFuture<'_, Result<(), BoxError>> {
        Box::pin(async { Ok(()) })
    }
}
