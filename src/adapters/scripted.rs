//! Scripted process executor for tests and demos.
//!
//! Each program name is mapped to a canned behaviour. Programs without one
//! behave as missing executables. The same executor doubles as a binary
//! resolver with a fixed name-to-path table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::ports::{
    BinaryResolver, BoxError, ExecFuture, ExecutionResult, ProcessEvent, ProcessExecutor,
    ProgressProcessExecutor, RunningProcess,
};

#[derive(Clone)]
enum Behavior {
    Fail(String),
    FailAfterStart(String),
    Complete {
        ticks: usize,
        result: ExecutionResult,
    },
    Hang,
    CancelOnSpawn(CancellationToken),
}

/// A recorded launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program that was launched.
    pub program: String,
    /// Arguments it was given.
    pub args: Vec<String>,
}

/// Executor whose processes follow a script instead of touching the OS.
#[derive(Default)]
pub struct ScriptedExecutor {
    behaviors: HashMap<String, Behavior>,
    resolutions: HashMap<String, String>,
    invocations: Mutex<Vec<Invocation>>,
    cancels: Arc<AtomicUsize>,
}

fn not_found_message(program: &str) -> String {
    format!("{program}: command not found")
}

impl ScriptedExecutor {
    /// Creates an executor where every program is missing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `program` fail to launch as a missing executable.
    #[must_use]
    pub fn not_found(self, program: &str) -> Self {
        self.with(program, Behavior::Fail(not_found_message(program)))
    }

    /// Makes `program` fail to launch with `message`.
    #[must_use]
    pub fn fails(self, program: &str, message: &str) -> Self {
        self.with(program, Behavior::Fail(message.to_string()))
    }

    /// Makes `program` start and then report a launch failure with `message`.
    #[must_use]
    pub fn fails_after_start(self, program: &str, message: &str) -> Self {
        self.with(program, Behavior::FailAfterStart(message.to_string()))
    }

    /// Makes `program` run to completion with `result`.
    #[must_use]
    pub fn completes(self, program: &str, result: ExecutionResult) -> Self {
        self.completes_after_ticks(program, 0, result)
    }

    /// Makes `program` report `ticks` activity ticks, then complete with `result`.
    #[must_use]
    pub fn completes_after_ticks(
        self,
        program: &str,
        ticks: usize,
        result: ExecutionResult,
    ) -> Self {
        self.with(program, Behavior::Complete { ticks, result })
    }

    /// Makes `program` run until it is cancelled.
    #[must_use]
    pub fn hangs(self, program: &str) -> Self {
        self.with(program, Behavior::Hang)
    }

    /// Makes launching `program` cancel `token` and then fail as missing.
    #[must_use]
    pub fn cancels_on_spawn(self, program: &str, token: CancellationToken) -> Self {
        self.with(program, Behavior::CancelOnSpawn(token))
    }

    /// Makes `name` resolve to `path`. Unlisted names do not resolve.
    #[must_use]
    pub fn resolves(mut self, name: &str, path: &str) -> Self {
        self.resolutions.insert(name.to_string(), path.to_string());
        self
    }

    fn with(mut self, program: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(program.to_string(), behavior);
        self
    }

    /// Programs launched so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the invocation log lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.program).collect()
    }

    /// Every launch attempt so far, with arguments.
    ///
    /// # Panics
    ///
    /// Panics if the invocation log lock is poisoned.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().expect("invocation log poisoned").clone()
    }

    /// How many times `cancel()` was called on spawned processes.
    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, program: &str, args: &[String]) -> Behavior {
        self.invocations
            .lock()
            .expect("invocation log poisoned")
            .push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
            });
        self.behaviors
            .get(program)
            .cloned()
            .unwrap_or_else(|| Behavior::Fail(not_found_message(program)))
    }
}

impl ProcessExecutor for ScriptedExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
    ) -> ExecFuture<'a, Result<ExecutionResult, BoxError>> {
        let behavior = self.behavior_for(command, args);
        Box::pin(async move {
            match behavior {
                Behavior::Fail(message) | Behavior::FailAfterStart(message) => Err(message.into()),
                Behavior::Complete { result, .. } => Ok(result),
                Behavior::Hang => std::future::pending().await,
                Behavior::CancelOnSpawn(token) => {
                    token.cancel();
                    Err(not_found_message(command).into())
                }
            }
        })
    }
}

impl ProgressProcessExecutor for ScriptedExecutor {
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn RunningProcess>, BoxError> {
        let state = match self.behavior_for(command, args) {
            Behavior::Fail(message) => return Err(message.into()),
            Behavior::CancelOnSpawn(token) => {
                token.cancel();
                return Err(not_found_message(command).into());
            }
            Behavior::FailAfterStart(message) => ScriptedState::Fail(message),
            Behavior::Complete { ticks, result } => ScriptedState::Run { ticks, result },
            Behavior::Hang => ScriptedState::Hang,
        };
        Ok(Box::new(ScriptedProcess {
            state: Some(state),
            cancels: Arc::clone(&self.cancels),
        }))
    }
}

impl BinaryResolver for ScriptedExecutor {
    fn resolve<'a>(
        &'a self,
        name: &'a str,
    ) -> ExecFuture<'a, Result<Option<String>, BoxError>> {
        let path = self.resolutions.get(name).cloned();
        Box::pin(async move { Ok(path) })
    }
}

enum ScriptedState {
    Fail(String),
    Run {
        ticks: usize,
        result: ExecutionResult,
    },
    Hang,
}

struct ScriptedProcess {
    state: Option<ScriptedState>,
    cancels: Arc<AtomicUsize>,
}

impl RunningProcess for ScriptedProcess {
    fn next_event(&mut self) -> ExecFuture<'_, ProcessEvent> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            match self.state.take() {
                Some(ScriptedState::Run { ticks, result }) if ticks > 0 => {
                    self.state = Some(ScriptedState::Run {
                        ticks: ticks - 1,
                        result,
                    });
                    ProcessEvent::Tick
                }
                Some(ScriptedState::Run { result, .. }) => ProcessEvent::Exited(Ok(result)),
                Some(ScriptedState::Fail(message)) => ProcessEvent::Exited(Err(message.into())),
                Some(ScriptedState::Hang) | None => {
                    self.state = Some(ScriptedState::Hang);
                    std::future::pending().await
                }
            }
        })
    }

    fn cancel(&mut self) -> ExecFuture<'_, Result<(), BoxError>> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}
