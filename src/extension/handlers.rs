//! Command handlers: build candidates, run them, show the result.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::output::{describe_run_error, failure_message, interpret};
use super::settings::Settings;
use super::{CommandOutcome, ExtensionCommand};
use crate::context::ServiceContext;
use crate::ports::{Dialog, Host, Notification, NotificationLevel, ProgressSink, ProgressUpdate};
use crate::runner::{run, run_with_progress, CandidateList, RunError, RunOutcome};
use crate::script::javascript::{version_args, Script};
use crate::script::powershell;

/// Arguments a command was invoked with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Selected files.
    pub paths: Vec<PathBuf>,
    /// Inline JSON text; takes precedence over the first selected file.
    pub json: Option<String>,
    /// Transform expression.
    pub expression: Option<String>,
}

impl Invocation {
    /// An invocation on a file selection.
    #[must_use]
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileHash {
    digest: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SystemInfo {
    platform: String,
    release: String,
    arch: String,
    cpus: u64,
    total_memory: u64,
    free_memory: u64,
    uptime: u64,
    hostname: String,
}

/// Formats a byte count in GiB with one decimal.
#[allow(clippy::cast_precision_loss)]
fn format_gib(bytes: u64) -> String {
    format!("{:.1} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}

impl SystemInfo {
    fn render(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "Hostname: {}", self.hostname);
        let _ = writeln!(text, "Platform: {} {} ({})", self.platform, self.release, self.arch);
        let _ = writeln!(text, "CPUs: {}", self.cpus);
        let _ = writeln!(
            text,
            "Memory: {} free of {}",
            format_gib(self.free_memory),
            format_gib(self.total_memory)
        );
        let _ = write!(text, "Uptime: {}", format_uptime(self.uptime));
        text
    }
}

/// One file's share of a multi-file run, reported on the shared sink.
struct FileShare<'s> {
    inner: &'s dyn ProgressSink,
    scale: f64,
}

impl<'s> FileShare<'s> {
    #[allow(clippy::cast_precision_loss)]
    fn new(inner: &'s dyn ProgressSink, files: usize) -> Self {
        Self {
            inner,
            scale: 1.0 / files.max(1) as f64,
        }
    }
}

impl ProgressSink for FileShare<'_> {
    fn report(&self, update: ProgressUpdate) {
        self.inner.report(ProgressUpdate {
            increment: update.increment * self.scale,
            ..update
        });
    }
}

/// The extension's command handlers, bound to a host and a service context.
pub struct Extension<'a> {
    ctx: &'a ServiceContext,
    host: &'a dyn Host,
}

impl<'a> Extension<'a> {
    /// Binds the handlers to `ctx` and `host`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, host: &'a dyn Host) -> Self {
        Self { ctx, host }
    }

    /// Runs `command` with `invocation`.
    pub async fn execute(
        &self,
        command: ExtensionCommand,
        invocation: &Invocation,
        token: &CancellationToken,
    ) -> CommandOutcome {
        tracing::info!(command = command.id(), "executing command");
        match command {
            ExtensionCommand::HashFiles => self.hash_files(&invocation.paths, token).await,
            ExtensionCommand::TransformJson => {
                let json = match (&invocation.json, invocation.paths.first()) {
                    (Some(json), _) => json.clone(),
                    (None, Some(path)) => match std::fs::read_to_string(path) {
                        Ok(json) => json,
                        Err(err) => {
                            return self.failed(
                                "Transform failed",
                                format!("could not read {}: {err}", path.display()),
                            );
                        }
                    },
                    (None, None) => {
                        return self.failed("Transform failed", "no JSON given".into());
                    }
                };
                let expression = invocation.expression.as_deref().unwrap_or_default();
                self.transform_json(&json, expression, token).await
            }
            ExtensionCommand::SystemInfo => self.system_info(token).await,
            ExtensionCommand::RuntimeInfo => self.runtime_info().await,
        }
    }

    /// Hashes every file in `paths` and lists the digests in a dialog.
    ///
    /// The files share one progress bar, each run filling an equal part of it.
    pub async fn hash_files(
        &self,
        paths: &[PathBuf],
        token: &CancellationToken,
    ) -> CommandOutcome {
        if paths.is_empty() {
            return self.failed("Hashing failed", "no files selected".into());
        }
        let settings = Settings::load(self.host);
        let algorithm = settings.hash_algorithm;
        let progress = self.host.progress("Hashing files");
        let mut lines = Vec::with_capacity(paths.len());
        let mut used = String::new();

        for path in paths {
            let path_text = path.to_string_lossy();
            let script = Script::hash(&path_text, algorithm.as_str());
            let shell = powershell::hash_script(&path_text, algorithm);
            let candidates = self.candidates(&settings, &script, &shell).await;

            let share = FileShare::new(progress.as_ref(), paths.len());
            match self.launch(&candidates, &share, token).await {
                Ok(RunOutcome::Completed {
                    result,
                    command_used,
                }) => match interpret(&result).and_then(parse::<FileHash>) {
                    Ok(hash) => {
                        lines.push(format!("{}  {}", hash.digest, path.display()));
                        used = command_used;
                    }
                    Err(message) => {
                        let message = format!("{}: {message}", path.display());
                        return self.failed("Hashing failed", message);
                    }
                },
                Ok(RunOutcome::Cancelled { timed_out }) => {
                    return self.stopped("Hashing", timed_out, &settings);
                }
                Err(err) => {
                    let message = describe_run_error(&err, &settings.runtime);
                    return self.failed("Hashing failed", message);
                }
            }
        }

        self.host.show_dialog(Dialog {
            title: format!("{} hashes", algorithm.as_str().to_uppercase()),
            message: lines.join("\n"),
            detail: Some(format!("Computed with {used}")),
            modal: false,
        });
        CommandOutcome::Succeeded
    }

    /// Evaluates `expression` over the parsed `json` and shows the result.
    ///
    /// Invalid JSON is rejected before anything is launched.
    pub async fn transform_json(
        &self,
        json: &str,
        expression: &str,
        token: &CancellationToken,
    ) -> CommandOutcome {
        if let Err(err) = serde_json::from_str::<Value>(json) {
            return self.failed("Transform failed", format!("invalid JSON: {err}"));
        }
        if expression.trim().is_empty() {
            return self.failed("Transform failed", "no expression given".into());
        }

        let settings = Settings::load(self.host);
        let script = Script::transform(json, expression);
        let shell = powershell::transform_script(json, expression);
        let candidates = self.candidates(&settings, &script, &shell).await;
        let progress = self.host.progress("Transforming JSON");

        match self.launch(&candidates, progress.as_ref(), token).await {
            Ok(RunOutcome::Completed {
                result,
                command_used,
            }) => match interpret(&result) {
                Ok(value) => {
                    let message = serde_json::to_string_pretty(&value)
                        .unwrap_or_else(|_| value.to_string());
                    self.host.show_dialog(Dialog {
                        title: "Transform result".into(),
                        message,
                        detail: Some(format!("Evaluated with {command_used}")),
                        modal: true,
                    });
                    CommandOutcome::Succeeded
                }
                Err(message) => self.failed("Transform failed", message),
            },
            Ok(RunOutcome::Cancelled { timed_out }) => {
                self.stopped("Transform", timed_out, &settings)
            }
            Err(err) => {
                self.failed("Transform failed", describe_run_error(&err, &settings.runtime))
            }
        }
    }

    /// Shows platform, memory and uptime facts.
    pub async fn system_info(&self, token: &CancellationToken) -> CommandOutcome {
        let settings = Settings::load(self.host);
        let script = Script::system_info();
        let shell = powershell::system_info_script();
        let candidates = self.candidates(&settings, &script, &shell).await;
        let progress = self.host.progress("Collecting system information");

        match self.launch(&candidates, progress.as_ref(), token).await {
            Ok(RunOutcome::Completed {
                result,
                command_used,
            }) => match interpret(&result).and_then(parse::<SystemInfo>) {
                Ok(info) => {
                    self.host.show_dialog(Dialog {
                        title: "System information".into(),
                        message: info.render(),
                        detail: Some(format!("Reported by {command_used}")),
                        modal: false,
                    });
                    CommandOutcome::Succeeded
                }
                Err(message) => self.failed("System information failed", message),
            },
            Ok(RunOutcome::Cancelled { timed_out }) => {
                self.stopped("System information", timed_out, &settings)
            }
            Err(err) => {
                let message = describe_run_error(&err, &settings.runtime);
                self.failed("System information failed", message)
            }
        }
    }

    /// Asks the configured runtime for its version.
    ///
    /// Uses the plain runner; there is no shell fallback for this command.
    pub async fn runtime_info(&self) -> CommandOutcome {
        let settings = Settings::load(self.host);
        let resolver = self.ctx.resolver.as_ref();
        let candidates =
            CandidateList::for_runtime(resolver, &settings.runtime, &version_args()).await;

        match run(self.ctx.process.as_ref(), candidates.as_slice()).await {
            Ok(result) if result.success() => {
                let version = result.stdout.trim();
                self.host.notify(Notification {
                    level: NotificationLevel::Info,
                    title: "Runtime".into(),
                    message: format!("{version} (via {})", runtime_label(&settings.runtime)),
                });
                CommandOutcome::Succeeded
            }
            Ok(result) => self.failed("Runtime check failed", failure_message(&result)),
            Err(err) => {
                let message = describe_run_error(&err, &settings.runtime);
                self.failed("Runtime check failed", message)
            }
        }
    }

    async fn launch(
        &self,
        candidates: &CandidateList,
        progress: &dyn ProgressSink,
        token: &CancellationToken,
    ) -> Result<RunOutcome, RunError> {
        let executor = self.ctx.progress_process.as_ref();
        run_with_progress(executor, candidates.as_slice(), progress, token).await
    }

    async fn candidates(
        &self,
        settings: &Settings,
        script: &Script,
        shell: &str,
    ) -> CandidateList {
        let args = script.args_for(&settings.runtime);
        let fallback = settings.shell_fallback && self.ctx.shell_fallback;
        CandidateList::for_runtime(self.ctx.resolver.as_ref(), &settings.runtime, &args)
            .await
            .with_shell_fallback(fallback, shell, Some(settings.shell_timeout))
    }

    fn failed(&self, title: &str, message: String) -> CommandOutcome {
        tracing::warn!(title, message = %message, "command failed");
        self.host.notify(Notification {
            level: NotificationLevel::Error,
            title: title.to_string(),
            message: message.clone(),
        });
        CommandOutcome::Failed(message)
    }

    fn stopped(&self, operation: &str, timed_out: bool, settings: &Settings) -> CommandOutcome {
        if timed_out {
            return self.failed(
                &format!("{operation} failed"),
                format!("timed out after {}s", settings.shell_timeout.as_secs()),
            );
        }
        self.host.notify(Notification {
            level: NotificationLevel::Warning,
            title: operation.to_string(),
            message: "cancelled".into(),
        });
        CommandOutcome::Cancelled
    }
}

fn parse<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("unexpected script output: {e}"))
}

fn runtime_label(runtime: &str) -> &str {
    Path::new(runtime)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(runtime)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::adapters::memory::MemoryHost;
    use crate::adapters::scripted::ScriptedExecutor;
    use crate::extension::{activate, settings};
    use crate::ports::ExecutionResult;
    use crate::runner::{SHELL_ALTERNATE, SHELL_PRIMARY};

    fn ok(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    fn digest(value: &str) -> ExecutionResult {
        ok(&json!({"output": {"algorithm": "sha256", "digest": value, "path": "f"}}).to_string())
    }

    fn host() -> MemoryHost {
        let host = MemoryHost::new();
        activate(&host);
        host
    }

    fn ctx(
        exec: ScriptedExecutor,
        shell_fallback: bool,
    ) -> (ServiceContext, Arc<ScriptedExecutor>) {
        let exec = Arc::new(exec);
        let ctx = ServiceContext::scripted(Arc::clone(&exec)).with_shell_fallback(shell_fallback);
        (ctx, exec)
    }

    #[tokio::test]
    async fn hash_lists_digest_and_runtime_used() {
        let exec = ScriptedExecutor::new()
            .resolves("node", "/usr/bin/node")
            .completes("/usr/bin/node", digest("abc123"));
        let (ctx, exec) = ctx(exec, false);
        let host = host();

        let outcome = Extension::new(&ctx, &host)
            .hash_files(&[PathBuf::from("a.txt")], &CancellationToken::new())
            .await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        let dialog = &host.dialogs()[0];
        assert_eq!(dialog.title, "SHA256 hashes");
        assert_eq!(dialog.message, "abc123  a.txt");
        assert_eq!(dialog.detail.as_deref(), Some("Computed with /usr/bin/node"));
        let invocation = &exec.invocations()[0];
        assert_eq!(invocation.args[0], "-e");
        assert!(invocation.args[2].contains("\"algorithm\":\"sha256\""));
    }

    #[tokio::test]
    async fn hash_falls_back_to_shell_when_runtime_is_missing() {
        let exec = ScriptedExecutor::new().completes(
            SHELL_ALTERNATE,
            ok(r#"{"output":{"algorithm":"md5","digest":"d41d8","path":"x"}}"#),
        );
        let (ctx, exec) = ctx(exec, true);
        let host = host();
        host.set_setting(settings::HASH_ALGORITHM, json!("md5"));

        let outcome = Extension::new(&ctx, &host)
            .hash_files(&[PathBuf::from("x")], &CancellationToken::new())
            .await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        assert_eq!(exec.calls(), vec!["node", SHELL_PRIMARY, SHELL_ALTERNATE]);
        assert!(exec.invocations()[2]
            .args
            .last()
            .unwrap()
            .contains("-Algorithm MD5"));
    }

    #[tokio::test]
    async fn files_share_one_progress_bar() {
        let exec = ScriptedExecutor::new().completes_after_ticks("node", 200, digest("ff"));
        let (ctx, exec) = ctx(exec, false);
        let host = host();
        let paths = vec![
            PathBuf::from("a"),
            PathBuf::from("b"),
            PathBuf::from("c"),
        ];

        let outcome = Extension::new(&ctx, &host)
            .hash_files(&paths, &CancellationToken::new())
            .await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        assert_eq!(exec.calls().len(), 3);
        let total: f64 = host.progress_updates().iter().map(|u| u.increment).sum();
        assert!(total <= 100.0 + 1e-9, "progress overshot: {total}");
        assert!(total > 90.0 - 1e-9);
    }

    #[tokio::test]
    async fn user_setting_disables_shell_fallback() {
        let (ctx, exec) = ctx(ScriptedExecutor::new(), true);
        let host = host();
        host.set_setting(settings::SHELL_FALLBACK, json!(false));

        let outcome = Extension::new(&ctx, &host)
            .system_info(&CancellationToken::new())
            .await;

        assert!(
            matches!(outcome, CommandOutcome::Failed(ref m) if m.contains("node is not installed"))
        );
        assert_eq!(exec.calls(), vec!["node"]);
        assert_eq!(host.notifications()[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn script_error_envelope_is_reported() {
        let failed = ExecutionResult {
            exit_code: 1,
            stdout: r#"{"error":"ENOENT: missing.txt"}"#.into(),
            stderr: String::new(),
        };
        let exec = ScriptedExecutor::new().completes("node", failed);
        let (ctx, _) = ctx(exec, false);
        let host = host();

        let outcome = Extension::new(&ctx, &host)
            .hash_files(&[PathBuf::from("missing.txt")], &CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            CommandOutcome::Failed("missing.txt: ENOENT: missing.txt".into())
        );
        assert!(host.dialogs().is_empty());
    }

    #[tokio::test]
    async fn invalid_json_fails_without_launching() {
        let (ctx, exec) = ctx(ScriptedExecutor::new(), true);
        let host = host();

        let outcome = Extension::new(&ctx, &host)
            .transform_json("{not json", "data", &CancellationToken::new())
            .await;

        assert!(
            matches!(outcome, CommandOutcome::Failed(ref m) if m.starts_with("invalid JSON"))
        );
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn transform_shows_pretty_result_in_modal() {
        let exec = ScriptedExecutor::new().completes("bun", ok(r#"{"output":{"total":3}}"#));
        let (ctx, exec) = ctx(exec, false);
        let host = host();
        host.set_setting(settings::RUNTIME, json!("bun"));

        let outcome = Extension::new(&ctx, &host)
            .transform_json(
                r#"{"a":1,"b":2}"#,
                "({ total: data.a + data.b })",
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        let dialog = &host.dialogs()[0];
        assert!(dialog.modal);
        assert_eq!(dialog.message, "{\n  \"total\": 3\n}");
        assert_eq!(exec.invocations()[0].args[0], "-e");
    }

    #[tokio::test]
    async fn cancelled_transform_warns_without_dialog() {
        let token = CancellationToken::new();
        let (ctx, _) = ctx(ScriptedExecutor::new().hangs("node"), false);
        let host = host();
        let extension = Extension::new(&ctx, &host);

        let run = extension.transform_json("[1]", "data.length", &token);
        let cancel = async {
            tokio::task::yield_now().await;
            token.cancel();
        };
        let (outcome, ()) = tokio::join!(run, cancel);

        assert_eq!(outcome, CommandOutcome::Cancelled);
        assert_eq!(host.notifications()[0].level, NotificationLevel::Warning);
        assert!(host.dialogs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shell_timeout_is_a_failure() {
        let (ctx, _) = ctx(ScriptedExecutor::new().hangs(SHELL_PRIMARY), true);
        let host = host();
        host.set_setting(settings::SHELL_TIMEOUT_SECONDS, json!(2));

        let outcome = Extension::new(&ctx, &host)
            .system_info(&CancellationToken::new())
            .await;

        assert_eq!(outcome, CommandOutcome::Failed("timed out after 2s".into()));
    }

    #[tokio::test]
    async fn system_info_is_rendered() {
        let stdout = json!({"output": {
            "platform": "linux", "release": "6.1.0", "arch": "x64", "cpus": 8,
            "totalMemory": 17_179_869_184_u64, "freeMemory": 4_294_967_296_u64,
            "uptime": 93_780, "hostname": "box"
        }})
        .to_string();
        let (ctx, _) = ctx(ScriptedExecutor::new().completes("node", ok(&stdout)), false);
        let host = host();

        let outcome = Extension::new(&ctx, &host)
            .system_info(&CancellationToken::new())
            .await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        assert_eq!(
            host.dialogs()[0].message,
            "Hostname: box\n\
             Platform: linux 6.1.0 (x64)\n\
             CPUs: 8\n\
             Memory: 4.0 GiB free of 16.0 GiB\n\
             Uptime: 1d 2h 3m"
        );
    }

    #[tokio::test]
    async fn runtime_info_uses_plain_runner_without_shell() {
        let exec = ScriptedExecutor::new()
            .resolves("deno", "/opt/deno/bin/deno")
            .not_found("/opt/deno/bin/deno")
            .completes("deno", ok("deno 1.44.0\n"));
        let (ctx, exec) = ctx(exec, true);
        let host = host();
        host.set_setting(settings::RUNTIME, json!("deno"));

        let outcome = Extension::new(&ctx, &host).runtime_info().await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        assert_eq!(exec.calls(), vec!["/opt/deno/bin/deno", "deno"]);
        assert_eq!(host.notifications()[0].message, "deno 1.44.0 (via deno)");
    }

    #[tokio::test]
    async fn transform_reads_json_from_selected_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{\"n\":41}").unwrap();
        let exec = ScriptedExecutor::new().completes("node", ok(r#"{"output":42}"#));
        let (ctx, exec) = ctx(exec, false);
        let host = host();
        let invocation = Invocation {
            expression: Some("data.n + 1".into()),
            ..Invocation::with_paths(vec![path])
        };

        let outcome = Extension::new(&ctx, &host)
            .execute(
                ExtensionCommand::TransformJson,
                &invocation,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, CommandOutcome::Succeeded);
        assert!(exec.invocations()[0].args[2].contains(r#"{\"n\":41}"#));
        assert_eq!(host.dialogs()[0].message, "42");
    }
}
