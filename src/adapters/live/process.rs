//! Live process executors using `tokio::process`.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::ports::{
    BoxError, ExecFuture, ExecutionResult, ProcessEvent, ProcessExecutor, ProgressProcessExecutor,
    RunningProcess,
};

/// How often a running process reports activity by default.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Maps a spawn failure to a port error; missing binaries say `command not found`.
fn launch_error(command: &str, err: &io::Error) -> BoxError {
    if err.kind() == io::ErrorKind::NotFound {
        format!("{command}: command not found").into()
    } else {
        format!("failed to launch {command}: {err}").into()
    }
}

fn to_result(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> ExecutionResult {
    ExecutionResult {
        exit_code: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(stdout).into_owned(),
        stderr: String::from_utf8_lossy(stderr).into_owned(),
    }
}

/// Live executor that runs a command to completion.
pub struct LiveProcessExecutor;

impl ProcessExecutor for LiveProcessExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        args: &'a [String],
    ) -> ExecFuture<'a, Result<ExecutionResult, BoxError>> {
        Box::pin(async move {
            let output = Command::new(command)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|err| launch_error(command, &err))?;
            Ok(to_result(output.status, &output.stdout, &output.stderr))
        })
    }
}

/// Live executor whose processes tick on a fixed interval and can be killed.
pub struct LiveProgressExecutor {
    tick_interval: Duration,
}

impl LiveProgressExecutor {
    /// Creates an executor ticking every [`DEFAULT_TICK_INTERVAL`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Overrides the tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

impl Default for LiveProgressExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressProcessExecutor for LiveProgressExecutor {
    fn spawn(&self, command: &str, args: &[String]) -> Result<Box<dyn RunningProcess>, BoxError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| launch_error(command, &err))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (done_tx, done_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(supervise(child, stdout, stderr, kill_rx, done_tx));

        let mut ticks = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Box::new(LiveProcess {
            ticks,
            done: done_rx,
            kill: Some(kill_tx),
        }))
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(err) = pipe.read_to_end(&mut buf).await {
            tracing::debug!(error = %err, "failed to read child output");
        }
    }
    buf
}

/// Waits for the child, or kills it when `kill` fires or its sender is dropped.
async fn supervise(
    mut child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    kill: oneshot::Receiver<()>,
    done: oneshot::Sender<Result<ExecutionResult, BoxError>>,
) {
    let output = async {
        let (out, err) = tokio::join!(read_pipe(stdout), read_pipe(stderr));
        let status = child.wait().await;
        (status, out, err)
    };

    let finished = tokio::select! {
        finished = output => Some(finished),
        _ = kill => None,
    };

    match finished {
        Some((status, out, err)) => {
            let result = status
                .map(|status| to_result(status, &out, &err))
                .map_err(|e| BoxError::from(format!("failed to wait for process: {e}")));
            // The receiver is gone if the runner stopped listening.
            let _ = done.send(result);
        }
        None => {
            if let Err(err) = child.kill().await {
                tracing::debug!(error = %err, "failed to kill child process");
            }
        }
    }
}

struct LiveProcess {
    ticks: Interval,
    done: oneshot::Receiver<Result<ExecutionResult, BoxError>>,
    kill: Option<oneshot::Sender<()>>,
}

impl RunningProcess for LiveProcess {
    fn next_event(&mut self) -> ExecFuture<'_, ProcessEvent> {
        Box::pin(async move {
            tokio::select! {
                biased;
                done = &mut self.done => ProcessEvent::Exited(
                    done.unwrap_or_else(|_| Err("process supervisor stopped unexpectedly".into())),
                ),
                _ = self.ticks.tick() => ProcessEvent::Tick,
            }
        })
    }

    fn cancel(&mut self) -> ExecFuture<'_, Result<(), BoxError>> {
        if let Some(kill) = self.kill.take() {
            // A closed channel means the process already exited.
            let _ = kill.send(());
        }
        Box::pin(async { Ok(()) })
    }
}
