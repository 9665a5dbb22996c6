//! Sequential fallback over command candidates, without progress.

use crate::ports::{BoxError, ExecutionResult, ProcessExecutor};

use super::candidate::CommandCandidate;
use super::classify::is_not_found;
use super::error::RunError;

/// Runs candidates in order until one launches.
///
/// A missing executable moves on to the next candidate; any other launch
/// failure stops immediately. A process that ran is a success whatever its
/// exit code, which is left for the caller to interpret. Candidate timeouts
/// are ignored here.
///
/// # Errors
///
/// Returns [`RunError::Launch`] for a fatal launch failure,
/// [`RunError::Exhausted`] with the last not-found error when no candidate
/// exists, or [`RunError::NoCandidates`] for an empty list.
pub async fn run(
    executor: &dyn ProcessExecutor,
    candidates: &[CommandCandidate],
) -> Result<ExecutionResult, RunError> {
    let mut last_missing: Option<(String, BoxError)> = None;

    for candidate in candidates {
        let program = candidate.program();
        tracing::debug!(command = program, "trying candidate");
        match executor.execute(program, candidate.args()).await {
            Ok(result) => {
                tracing::debug!(command = program, exit_code = result.exit_code, "candidate ran");
                return Ok(result);
            }
            Err(err) if is_not_found(&err) => {
                tracing::info!(
                    command = program,
                    error = %err,
                    "candidate not found, falling back"
                );
                last_missing = Some((program.to_string(), err));
            }
            Err(err) => {
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
