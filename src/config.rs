//! Runtime configuration read from the environment.
//!
//! `.env` is loaded by `main` before this runs, so values there apply too.

use std::path::PathBuf;

/// Settings file read by the console host.
pub const SETTINGS_VAR: &str = "SIGMA_SETTINGS";
/// Directory to record cassettes into.
pub const RECORD_VAR: &str = "SIGMA_RECORD";
/// Cassette to replay instead of launching processes.
pub const REPLAY_VAR: &str = "SIGMA_REPLAY";
/// Overrides the platform's PowerShell fallback flag.
pub const SHELL_FALLBACK_VAR: &str = "SIGMA_SHELL_FALLBACK";
/// Tracing filter directives.
pub const LOG_VAR: &str = "SIGMA_LOG";
/// `json` switches log output to JSON lines.
pub const LOG_FORMAT_VAR: &str = "SIGMA_LOG_FORMAT";

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = ".sigma/settings.yaml";
/// Default cassette directory when `SIGMA_RECORD` is set but empty.
pub const DEFAULT_CASSETTE_DIR: &str = ".sigma/cassettes";

/// Where commands get their processes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Launch real processes.
    Live,
    /// Launch real processes and record them under this directory.
    Record(PathBuf),
    /// Serve processes from this cassette.
    Replay(PathBuf),
}

/// Configuration for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// User settings file.
    pub settings_path: PathBuf,
    /// Live, recording or replaying.
    pub mode: Mode,
    /// Explicit PowerShell fallback override; `None` keeps the platform default.
    pub shell_fallback: Option<bool>,
    /// Tracing filter directives, if set.
    pub log_filter: Option<String>,
    /// Emit JSON log lines.
    pub json_logs: bool,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error for conflicting or malformed values.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error when both recording and replaying are requested or
    /// `SIGMA_SHELL_FALLBACK` is not a boolean.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let settings_path = lookup(SETTINGS_VAR)
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH), PathBuf::from);

        let mode = match (lookup(RECORD_VAR), lookup(REPLAY_VAR)) {
            (Some(_), Some(_)) => {
                return Err(format!("{RECORD_VAR} and {REPLAY_VAR} cannot be used together"));
            }
            (Some(dir), None) if dir.trim().is_empty() => {
                Mode::Record(PathBuf::from(DEFAULT_CASSETTE_DIR))
            }
            (Some(dir), None) => Mode::Record(PathBuf::from(dir)),
            (None, Some(path)) => Mode::Replay(PathBuf::from(path)),
            (None, None) => Mode::Live,
        };

        let shell_fallback = match lookup(SHELL_FALLBACK_VAR) {
            None => None,
            Some(value) => Some(parse_flag(&value).ok_or_else(|| {
                format!("{SHELL_FALLBACK_VAR} must be 0 or 1 (got {value:?})")
            })?),
        };

        Ok(Self {
            settings_path,
            mode,
            shell_fallback,
            log_filter: lookup(LOG_VAR).filter(|v| !v.trim().is_empty()),
            json_logs: lookup(LOG_FORMAT_VAR).is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.settings_path, PathBuf::from(DEFAULT_SETTINGS_PATH));
        assert_eq!(config.mode, Mode::Live);
        assert_eq!(config.shell_fallback, None);
        assert!(!config.json_logs);
    }

    #[test]
    fn record_and_replay_are_exclusive() {
        let err = config(&[(RECORD_VAR, "out"), (REPLAY_VAR, "c.yaml")]).unwrap_err();
        assert!(err.contains("cannot be used together"));
    }

    #[test]
    fn empty_record_uses_default_directory() {
        assert_eq!(
            config(&[(RECORD_VAR, "")]).unwrap().mode,
            Mode::Record(DEFAULT_CASSETTE_DIR.into())
        );
        assert_eq!(
            config(&[(REPLAY_VAR, "c.yaml")]).unwrap().mode,
            Mode::Replay("c.yaml".into())
        );
    }

    #[test]
    fn shell_fallback_flag_is_parsed() {
        assert_eq!(config(&[(SHELL_FALLBACK_VAR, "1")]).unwrap().shell_fallback, Some(true));
        assert_eq!(config(&[(SHELL_FALLBACK_VAR, "off")]).unwrap().shell_fallback, Some(false));
        assert!(config(&[(SHELL_FALLBACK_VAR, "maybe")]).is_err());
    }

    #[test]
    fn log_settings_are_read() {
        let config = config(&[(LOG_VAR, "sigma_demo=debug"), (LOG_FORMAT_VAR, "JSON")]).unwrap();
        assert_eq!(config.log_filter.as_deref(), Some("sigma_demo=debug"));
        assert!(config.json_logs);
    }
}
