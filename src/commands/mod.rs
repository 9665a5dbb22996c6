//! Command dispatch and handlers.

pub mod execute;
pub mod list;

use serde_json::json;

use crate::adapters::live::ConsoleHost;
use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::{Config, Mode};
use crate::context::ServiceContext;
use crate::extension::{self, settings, ExtensionCommand, Invocation};

/// Dispatch a parsed command to its handler.
///
/// With `SIGMA_RECORD` set, process and resolver interactions are recorded
/// to a cassette in a timestamped directory; with `SIGMA_REPLAY` set, they
/// are served from a cassette instead.
///
/// # Errors
///
/// Returns an error string if setup or the selected command fails.
pub fn dispatch(command: &Command, config: &Config) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    let host = ConsoleHost::from_settings_file(&config.settings_path)?;
    extension::activate(&host);

    let (ctx, session) = match &config.mode {
        Mode::Live => (ServiceContext::live(), None),
        Mode::Record(dir) => {
            let (ctx, session) = ServiceContext::recording_at(dir)?;
            (ctx, Some(session))
        }
        Mode::Replay(path) => (ServiceContext::replaying(path)?, None),
    };
    let ctx = match config.shell_fallback {
        Some(enabled) => ctx.with_shell_fallback(enabled),
        None => ctx,
    };

    let result = runtime.block_on(dispatch_with_context(command, &ctx, &host));

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context and host.
async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    host: &ConsoleHost,
) -> Result<(), String> {
    let (command, invocation) = match command {
        Command::List => {
            list::run(host.state());
            return Ok(());
        }
        Command::Hash { paths, algorithm } => {
            if let Some(algorithm) = algorithm {
                host.state().set_setting(settings::HASH_ALGORITHM, json!(algorithm.as_str()));
            }
            (ExtensionCommand::HashFiles, Invocation::with_paths(paths.clone()))
        }
        Command::Transform { json, file, expression } => (
            ExtensionCommand::TransformJson,
            Invocation {
                paths: file.iter().cloned().collect(),
                json: json.clone(),
                expression: Some(expression.clone()),
            },
        ),
        Command::Sysinfo => (ExtensionCommand::SystemInfo, Invocation::default()),
        Command::Runtime => (ExtensionCommand::RuntimeInfo, Invocation::default()),
    };
    execute::run(ctx, host, command, &invocation).await
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
