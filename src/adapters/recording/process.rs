//! Recording adapters for the process ports.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{
    BoxError, ExecFuture, ExecutionResult, ProcessEvent, ProcessExecutor, ProgressProcessExecutor,
    RunningProcess,
};

#[derive(Serialize)]
struct CommandInput<'a> {
    command: &'a str,
    args: &'a [String],
}

/// Records `execute` calls while delegating to an inner executor.
pub struct RecordingProcessExecutor {
    inner: Arc<dyn ProcessExecutor>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProcessExecutor {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Arc<dyn ProcessExecutor>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ProcessExecutor for RecordingProcessExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
    ) -> ExecFuture<'a, Result<ExecutionResult, BoxError>> {
        Box::pin(async move {
            let result = self.inner.execute(command, args).await;
            let input = CommandInput { command, args };
            record_result(&self.recorder, "process", "execute", &input, &result);
            result
        })
    }
}

/// Records `spawn` outcomes while delegating to an inner executor.
///
/// A launch failure is recorded immediately; a launched process is
/// recorded when it exits. Cancelled processes leave no interaction.
pub struct RecordingProgressExecutor {
    inner: Arc<dyn ProgressProcessExecutor>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProgressExecutor {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(
        inner: Arc<dyn ProgressProcessExecutor>,
        recorder: Arc<Mutex<CassetteRecorder>>,
    ) -> Self {
        Self { inner, recorder }
    }
}

impl ProgressProcessExecutor for RecordingProgressExecutor {
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn RunningProcess>, BoxError> {
        let input = serde_json::to_value(CommandInput { command, args })
            .expect("failed to serialize recording input");
        match self.inner.spawn(command, args) {
            Ok(process) => Ok(Box::new(RecordingProcess {
                inner: process,
                recorder: Arc::clone(&self.recorder),
                input,
            })),
            Err(err) => {
                let failed: Result<ExecutionResult, &BoxError> = Err(&err);
                record_result(&self.recorder, "process", "spawn", &input, &failed);
                Err(err)
            }
        }
    }
}

struct RecordingProcess {
    inner: Box<dyn RunningProcess>,
    recorder: Arc<Mutex<CassetteRecorder>>,
    input: serde_json::Value,
}

impl RunningProcess for RecordingProcess {
    fn next_event(&mut self) -> ExecFuture<'_, ProcessEvent> {
        Box::pin(async move {
            let event = self.inner.next_event().await;
            if let ProcessEvent::Exited(result) = &event {
                record_result(&self.recorder, "process", "spawn", &self.input, result);
            }
            event
        })
    }

    fn cancel(&mut self) -> ExecFuture<'_, Result<(), BoxError>> {
        self.inner.cancel()
    }
}
