//! Sequential fallback with progress reporting and cooperative cancellation.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::ports::{
    BoxError, ExecutionResult, ProcessEvent, ProgressProcessExecutor, ProgressSink, ProgressUpdate,
    RunningProcess,
};

use super::candidate::CommandCandidate;
use super::classify::is_not_found;
use super::error::RunError;

/// Progress credited when the first candidate starts; startup cost is front-loaded.
pub const FIRST_ATTEMPT_INCREMENT: f64 = 10.0;
/// Progress credited when a later candidate starts.
pub const RETRY_INCREMENT: f64 = 5.0;
/// Progress credited per activity tick.
pub const TICK_INCREMENT: f64 = 1.0;
/// Ticks stop adding progress once this much has been reported.
pub const TICK_CEILING: f64 = 90.0;
/// One run never reports more than this in total.
pub const PROGRESS_TOTAL: f64 = 100.0;

/// How a progress run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Cancellation was requested, or a candidate ran past its time limit.
    Cancelled {
        /// `true` when the cancellation came from a candidate timeout.
        timed_out: bool,
    },
    /// A candidate launched and ran to completion.
    Completed {
        /// What the process produced.
        result: ExecutionResult,
        /// The candidate program that produced it.
        command_used: String,
    },
}

impl RunOutcome {
    /// Returns `true` for [`RunOutcome::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

enum Attempt {
    Cancelled { timed_out: bool },
    Finished(ExecutionResult),
    Failed(BoxError),
}

enum Step {
    Cancelled,
    TimedOut,
    Event(ProcessEvent),
}

/// Runs candidates in order, reporting progress and honouring `token`.
///
/// Follows the same fallback rules as [`super::run`], with three additions:
/// the token is checked before every launch, a cancellation request while a
/// candidate runs cancels that process once and ends the run, and an error
/// that arrives after cancellation was requested is reported as a
/// cancellation. Candidates with a timeout are cancelled when it expires.
///
/// The increments of one run add up to at most [`PROGRESS_TOTAL`].
///
/// # Errors
///
/// Same as [`super::run`].
pub async fn run_with_progress(
    executor: &dyn ProgressProcessExecutor,
    candidates: &[CommandCandidate],
    progress: &dyn ProgressSink,
    token: &CancellationToken,
) -> Result<RunOutcome, RunError> {
    let mut last_missing: Option<(String, BoxError)> = None;
    let mut reported = 0.0_f64;

    for (index, candidate) in candidates.iter().enumerate() {
        if token.is_cancelled() {
            tracing::info!("cancelled before launching next candidate");
            return Ok(RunOutcome::Cancelled { timed_out: false });
        }

        let program = candidate.program();
        let increment = if index == 0 {
            FIRST_ATTEMPT_INCREMENT
        } else {
            RETRY_INCREMENT
        };
        let increment = increment.min(PROGRESS_TOTAL - reported).max(0.0);
        reported += increment;
        progress.report(ProgressUpdate {
            description: format!("Starting {program}"),
            increment,
        });
        tracing::debug!(command = program, "launching candidate");

        let attempt = match executor.spawn(program, candidate.args()) {
            Ok(process) => watch(process, candidate, progress, token, &mut reported).await,
            Err(err) => Attempt::Failed(err),
        };

        match attempt {
            Attempt::Cancelled { timed_out } => return Ok(RunOutcome::Cancelled { timed_out }),
            Attempt::Finished(result) => {
                tracing::debug!(command = program, exit_code = result.exit_code, "candidate ran");
                return Ok(RunOutcome::Completed {
                    result,
                    command_used: program.to_string(),
                });
            }
            Attempt::Failed(_) if token.is_cancelled() => {
                return Ok(RunOutcome::Cancelled { timed_out: false });
            }
            Attempt::Failed(err) if is_not_found(&err) => {
                tracing::info!(
                    command = program,
                    error = %err,
                    "candidate not found, falling back"
                );
                last_missing = Some((program.to_string(), err));
            }
            Attempt::Failed(err) => {
                tracing::warn!(command = program, error = %err, "candidate failed to launch");
                return Err(RunError::Launch {
                    command: program.to_string(),
                    source: err,
                });
            }
        }
    }

    Err(match last_missing {
        Some((command, source)) => RunError::Exhausted { command, source },
        None => RunError::NoCandidates,
    })
}

/// Drives one launched candidate until it exits, is cancelled, or times out.
///
/// The cancellation hook lives only inside this function, so a later
/// candidate never sees a stale one.
async fn watch(
    mut process: Box<dyn RunningProcess>,
    candidate: &CommandCandidate,
    progress: &dyn ProgressSink,
    token: &CancellationToken,
    reported: &mut f64,
) -> Attempt {
    let program = candidate.program();
    let deadline = candidate.timeout().map(|limit| Instant::now() + limit);

    loop {
        let step = tokio::select! {
            biased;
            () = token.cancelled() => Step::Cancelled,
            () = sleep_until(deadline) => Step::TimedOut,
            event = process.next_event() => Step::Event(event),
        };

        match step {
            Step::Cancelled => {
                tracing::info!(command = program, "cancellation requested, stopping process");
                stop(process.as_mut(), program).await;
                return Attempt::Cancelled { timed_out: false };
            }
            Step::TimedOut => {
                tracing::warn!(
                    command = program,
                    timeout = ?candidate.timeout(),
                    "candidate timed out"
                );
                stop(process.as_mut(), program).await;
                return Attempt::Cancelled { timed_out: true };
            }
            Step::Event(ProcessEvent::Tick) => {
                let increment = if *reported < TICK_CEILING {
                    TICK_INCREMENT
                } else {
                    0.0
                };
                *reported += increment;
                progress.report(ProgressUpdate {
                    description: format!("Running {program}"),
                    increment,
                });
            }
            Step::Event(ProcessEvent::Exited(Ok(result))) => return Attempt::Finished(result),
            Step::Event(ProcessEvent::Exited(Err(err))) => return Attempt::Failed(err),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn stop(process: &mut dyn RunningProcess, program: &str) {
    if let Err(err) = process.cancel().await {
        tracing::debug!(command = program, error = %err, "failed to cancel process");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::memory::MemoryProgress;
    use crate::adapters::scripted::ScriptedExecutor;

    fn candidates(programs: &[&str]) -> Vec<CommandCandidate> {
        programs
            .iter()
            .map(|p| CommandCandidate::new(*p, ["-e", "0"]))
            .collect()
    }

    fn ok(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn total(progress: &MemoryProgress) -> f64 {
        progress.updates().iter().map(|u| u.increment).sum()
    }

    #[tokio::test]
    async fn first_attempt_gets_larger_increment_and_ticks_are_reported() {
        let exec = ScriptedExecutor::new().completes_after_ticks("bun", 3, ok("{}"));
        let progress = MemoryProgress::default();
        let outcome = run_with_progress(
            &exec,
            &candidates(&["node", "bun"]),
            &progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Completed {
                result: ok("{}"),
                command_used: "bun".into(),
            }
        );
        let increments: Vec<f64> = progress.updates().iter().map(|u| u.increment).collect();
        assert_eq!(
            increments,
            vec![FIRST_ATTEMPT_INCREMENT, RETRY_INCREMENT, 1.0, 1.0, 1.0]
        );
        assert_eq!(progress.updates()[2].description, "Running bun");
    }

    #[tokio::test]
    async fn tick_progress_stops_growing_at_ceiling() {
        let exec = ScriptedExecutor::new().completes_after_ticks("node", 120, ok("{}"));
        let progress = MemoryProgress::default();
        run_with_progress(
            &exec,
            &candidates(&["node"]),
            &progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(progress.updates().len(), 121);
        assert!((total(&progress) - TICK_CEILING).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn long_fallback_chain_never_exceeds_total() {
        let missing: Vec<String> = (0..20).map(|i| format!("rt{i}")).collect();
        let mut exec = ScriptedExecutor::new();
        for program in &missing {
            exec = exec.fails_after_start(program, &format!("{program}: command not found"));
        }
        let exec = exec.completes_after_ticks("last", 50, ok("{}"));
        let mut programs: Vec<&str> = missing.iter().map(String::as_str).collect();
        programs.push("last");

        let progress = MemoryProgress::default();
        let outcome = run_with_progress(
            &exec,
            &candidates(&programs),
            &progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!outcome.is_cancelled());
        assert_eq!(exec.calls().len(), 21);
        assert!((total(&progress) - PROGRESS_TOTAL).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn cancellation_beats_error_classification() {
        let token = CancellationToken::new();
        let exec = ScriptedExecutor::new().cancels_on_spawn("node", token.clone());
        let outcome = run_with_progress(
            &exec,
            &candidates(&["node", "bun"]),
            &MemoryProgress::default(),
            &token,
        )
        .await
        .unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled { timed_out: false });
        assert_eq!(exec.calls(), vec!["node"]);
    }

    #[tokio::test]
    async fn timeout_cancels_process_and_is_flagged() {
        let exec = ScriptedExecutor::new().hangs("powershell");
        let list = vec![
            CommandCandidate::new("powershell", ["-Command", "Start-Sleep 60"])
                .with_timeout(Duration::from_millis(20)),
        ];
        let outcome = run_with_progress(
            &exec,
            &list,
            &MemoryProgress::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled { timed_out: true });
        assert_eq!(exec.cancel_count(), 1);
    }

    #[tokio::test]
    async fn fatal_error_propagates() {
        let exec =
            ScriptedExecutor::new().fails("node", "failed to launch node: permission denied");
        let err = run_with_progress(
            &exec,
            &candidates(&["node", "bun"]),
            &MemoryProgress::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "failed to launch node: permission denied");
        assert_eq!(exec.calls(), vec!["node"]);
    }
}
