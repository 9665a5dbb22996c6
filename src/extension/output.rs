//! Turning process results into user-facing values and messages.

use serde_json::Value;

use crate::ports::ExecutionResult;
use crate::runner::RunError;

/// Parses the last non-empty stdout line as JSON, if it is JSON.
fn envelope(stdout: &str) -> Option<Value> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| serde_json::from_str(line).ok())
}

/// Best available explanation for a failed process.
#[must_use]
pub fn failure_message(result: &ExecutionResult) -> String {
    let stderr = result.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = result.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("process exited with code {}", result.exit_code)
}

/// Extracts the script's `output` value.
///
/// A `{"error": ...}` envelope wins over the exit code; otherwise a non-zero
/// exit is reported with [`failure_message`].
///
/// # Errors
///
/// Returns the script's error, the failure message, or a note that the
/// output was not an envelope.
pub fn interpret(result: &ExecutionResult) -> Result<Value, String> {
    let envelope = envelope(&result.stdout);

    if let Some(error) = envelope.as_ref().and_then(|v| v.get("error")) {
        return Err(error.as_str().map_or_else(|| error.to_string(), str::to_string));
    }
    if !result.success() {
        return Err(failure_message(result));
    }
    match envelope {
        Some(Value::Object(mut map)) if map.contains_key("output") => {
            Ok(map.remove("output").unwrap_or(Value::Null))
        }
        _ => Err(format!("unexpected script output: {}", result.stdout.trim())),
    }
}

/// User-facing message for a runner failure.
#[must_use]
pub fn describe_run_error(err: &RunError, runtime: &str) -> String {
    match err {
        RunError::Exhausted { .. } | RunError::NoCandidates => {
            format!("{runtime} is not installed or not on PATH ({err})")
        }
        RunError::Launch { command, .. } => format!("could not start {command}: {err}"),
    }
}
