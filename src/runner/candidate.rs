//! Command candidates and the ordered lists the runners walk.

use std::time::Duration;

use crate::ports::BinaryResolver;

/// Default PowerShell on `PATH`.
pub const SHELL_PRIMARY: &str = "powershell";
/// PowerShell 7+ on `PATH`.
pub const SHELL_ALTERNATE: &str = "pwsh";
/// Install location of Windows PowerShell when `PATH` is broken.
pub const SHELL_WELL_KNOWN_PATH: &str =
    r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";

/// One executable to try, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCandidate {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandCandidate {
    /// Creates a candidate running `program` with `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// Limits how long the progress runner lets this candidate run.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The executable identifier: a bare name or an absolute path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Time limit, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Arguments that make PowerShell run `script` non-interactively.
#[must_use]
pub fn shell_args(script: &str) -> Vec<String> {
    ["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command", script]
        .into_iter()
        .map(String::from)
        .collect()
}

/// PowerShell invocations of `script`, most likely to work first.
#[must_use]
pub fn shell_candidates(script: &str) -> Vec<CommandCandidate> {
    [SHELL_PRIMARY, SHELL_ALTERNATE, SHELL_WELL_KNOWN_PATH]
        .into_iter()
        .map(|shell| CommandCandidate::new(shell, shell_args(script)))
        .collect()
}

/// An ordered candidate list, deduplicated by program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    candidates: Vec<CommandCandidate>,
}

impl CandidateList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the candidates for a runtime binary.
    ///
    /// A resolved absolute path comes first; the bare `name` always follows
    /// so that `PATH` lookup at launch time is still attempted. Resolver
    /// errors count as "not resolved".
    pub async fn for_runtime(resolver: &dyn BinaryResolver, name: &str, args: &[String]) -> Self {
        let mut list = Self::new();
        match resolver.resolve(name).await {
            Ok(Some(path)) => {
                list.push(CommandCandidate::new(path, args.iter().cloned()));
            }
            Ok(None) => tracing::debug!(runtime = name, "runtime not resolved, relying on PATH"),
            Err(err) => tracing::debug!(runtime = name, error = %err, "runtime lookup failed"),
        }
        list.push(CommandCandidate::new(name, args.iter().cloned()));
        list
    }

    /// Appends the PowerShell invocations of `script` when `enabled`.
    ///
    /// Shell candidates always go after whatever is already in the list.
    #[must_use]
    pub fn with_shell_fallback(
        mut self,
        enabled: bool,
        script: &str,
        timeout: Option<Duration>,
    ) -> Self {
        if enabled {
            for candidate in shell_candidates(script) {
                let candidate = match timeout {
                    Some(limit) => candidate.with_timeout(limit),
                    None => candidate,
                };
                self.push(candidate);
            }
        }
        self
    }

    /// Appends `candidate` unless one with the same program is already listed.
    ///
    /// Returns `true` if it was added.
    pub fn push(&mut self, candidate: CommandCandidate) -> bool {
        if self
            .candidates
            .iter()
            .any(|existing| existing.program == candidate.program)
        {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    /// The candidates, in the order they will be tried.
    #[must_use]
    pub fn as_slice(&self) -> &[CommandCandidate] {
        &self.candidates
    }

    /// Program identifiers, in order.
    #[must_use]
    pub fn programs(&self) -> Vec<&str> {
        self.candidates.iter().map(CommandCandidate::program).collect()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if there is nothing to try.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{BoxError, ExecFuture};

    struct StaticResolver(Result<Option<String>, String>);

    impl BinaryResolver for StaticResolver {
        fn resolve<'a>(
            &'a self,
            _name: &'a str,
        ) -> ExecFuture<'a, Result<Option<String>, BoxError>> {
            let result = self.0.clone().map_err(BoxError::from);
            Box::pin(async move { result })
        }
    }

    fn args() -> Vec<String> {
        vec!["-e".into(), "1".into()]
    }

    #[tokio::test]
    async fn resolved_path_goes_first() {
        let resolver = StaticResolver(Ok(Some("/usr/local/bin/node".into())));
        let list = CandidateList::for_runtime(&resolver, "node", &args()).await;
        assert_eq!(list.programs(), vec!["/usr/local/bin/node", "node"]);
        assert_eq!(list.as_slice()[0].args(), args().as_slice());
    }

    #[tokio::test]
    async fn unresolved_or_failed_lookup_keeps_bare_name() {
        let none = CandidateList::for_runtime(&StaticResolver(Ok(None)), "node", &args()).await;
        let failed =
            CandidateList::for_runtime(&StaticResolver(Err("boom".into())), "node", &args()).await;
        assert_eq!(none.programs(), vec!["node"]);
        assert_eq!(failed.programs(), vec!["node"]);
    }

    #[tokio::test]
    async fn resolution_to_same_name_is_deduplicated() {
        let resolver = StaticResolver(Ok(Some("node".into())));
        let list = CandidateList::for_runtime(&resolver, "node", &args()).await;
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn shell_fallback_is_appended_after_runtime() {
        let resolver = StaticResolver(Ok(Some("/opt/deno".into())));
        let list = CandidateList::for_runtime(&resolver, "deno", &args())
            .await
            .with_shell_fallback(true, "Get-Date", Some(Duration::from_secs(5)));
        assert_eq!(
            list.programs(),
            vec![
                "/opt/deno",
                "deno",
                SHELL_PRIMARY,
                SHELL_ALTERNATE,
                SHELL_WELL_KNOWN_PATH
            ]
        );
        let shell = &list.as_slice()[2];
        assert_eq!(shell.args().last().map(String::as_str), Some("Get-Date"));
        assert_eq!(shell.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(list.as_slice()[0].timeout(), None);
    }

    #[tokio::test]
    async fn disabled_shell_fallback_adds_nothing() {
        let list = CandidateList::for_runtime(&StaticResolver(Ok(None)), "node", &args())
            .await
            .with_shell_fallback(false, "Get-Date", None);
        assert_eq!(list.programs(), vec!["node"]);
    }
}
