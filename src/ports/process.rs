//! Process execution ports for launching external commands.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Error type returned across port boundaries.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Boxed future type alias used by the process ports to keep them dyn-compatible.
pub type ExecFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The outcome of an external process that was launched and ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The exit code of the process (`-1` when terminated by a signal).
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
}

impl ExecutionResult {
    /// Returns `true` when the process exited with code zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Launches a command and waits for it to finish.
pub trait ProcessExecutor: Send + Sync {
    /// Runs `command` with `args`, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns an error only when the process could not be launched at all.
    /// A missing executable must produce a message containing `not found`.
    fn execute<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
    ) -> ExecFuture<'a, Result<ExecutionResult, BoxError>>;
}

/// An event reported by a [`RunningProcess`].
#[derive(Debug)]
pub enum ProcessEvent {
    /// The process is still running and reported activity.
    Tick,
    /// The process finished, or failed to start asynchronously.
    Exited(Result<ExecutionResult, BoxError>),
}

/// A process launched by a [`ProgressProcessExecutor`].
pub trait RunningProcess: Send {
    /// Waits for the next activity tick or for the process to exit.
    ///
    /// Must not be polled again after it has yielded [`ProcessEvent::Exited`].
    fn next_event(&mut self) -> ExecFuture<'_, ProcessEvent>;

    /// Requests termination of the process.
    ///
    /// Resolves once termination has been requested, not necessarily completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered.
    fn cancel(&mut self) -> ExecFuture<'_, Result<(), BoxError>>;
}

/// Launches commands that report activity and can be cancelled.
pub trait ProgressProcessExecutor: Send + Sync {
    /// Starts `command` with `args`.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be launched. A missing
    /// executable must produce a message containing `not found`.
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn RunningProcess>, BoxError>;
}
