//! Runs an extension command from the terminal, with Ctrl-C as cancellation.

use tokio_util::sync::CancellationToken;

use crate::context::ServiceContext;
use crate::extension::{CommandOutcome, Extension, ExtensionCommand, Invocation};
use crate::ports::Host;

/// Execute `command` and flatten its outcome for the CLI.
///
/// Cancellation counts as success; the host has already warned about it.
///
/// # Errors
///
/// Returns the failure message when the command failed.
pub async fn run(
    ctx: &ServiceContext,
    host: &dyn Host,
    command: ExtensionCommand,
    invocation: &Invocation,
) -> Result<(), String> {
    let token = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(token.clone()));

    let outcome = Extension::new(ctx, host).execute(command, invocation, &token).await;
    interrupt.abort();

    match outcome {
        CommandOutcome::Succeeded | CommandOutcome::Cancelled => Ok(()),
        CommandOutcome::Failed(message) => Err(format!("{} failed: {message}", command.id())),
    }
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("interrupt received, cancelling");
            token.cancel();
        }
        Err(err) => tracing::debug!(error = %err, "cannot listen for Ctrl-C"),
    }
}
