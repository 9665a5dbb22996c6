//! Settings the extension contributes, and how they are read back.

use std::time::Duration;

use serde_json::{json, Value};

use crate::ports::{Host, SettingDefinition, SettingKind};
use crate::script::HashAlgorithm;

/// JavaScript runtime binary.
pub const RUNTIME: &str = "sigma-demo.runtime";
/// Digest algorithm for file hashing.
pub const HASH_ALGORITHM: &str = "sigma-demo.hashAlgorithm";
/// Whether the PowerShell fallback may be used where the platform has it.
pub const SHELL_FALLBACK: &str = "sigma-demo.shellFallback";
/// Time limit for PowerShell fallback invocations.
pub const SHELL_TIMEOUT_SECONDS: &str = "sigma-demo.shellTimeoutSeconds";

/// Runtime used when the setting is absent.
pub const DEFAULT_RUNTIME: &str = "node";
/// Shell time limit used when the setting is absent.
pub const DEFAULT_SHELL_TIMEOUT_SECONDS: u64 = 30;

/// Setting definitions registered on activation.
#[must_use]
pub fn definitions() -> Vec<SettingDefinition> {
    vec![
        SettingDefinition {
            key: RUNTIME.into(),
            title: "JavaScript runtime".into(),
            kind: SettingKind::String,
            default: json!(DEFAULT_RUNTIME),
            options: Vec::new(),
        },
        SettingDefinition {
            key: HASH_ALGORITHM.into(),
            title: "Hash algorithm".into(),
            kind: SettingKind::String,
            default: json!(HashAlgorithm::default().as_str()),
            options: HashAlgorithm::ALL
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
        },
        SettingDefinition {
            key: SHELL_FALLBACK.into(),
            title: "Fall back to PowerShell".into(),
            kind: SettingKind::Boolean,
            default: json!(true),
            options: Vec::new(),
        },
        SettingDefinition {
            key: SHELL_TIMEOUT_SECONDS.into(),
            title: "PowerShell timeout (seconds)".into(),
            kind: SettingKind::Number,
            default: json!(DEFAULT_SHELL_TIMEOUT_SECONDS),
            options: Vec::new(),
        },
    ]
}

/// Typed view of the extension's settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Runtime binary name or path.
    pub runtime: String,
    /// Digest algorithm.
    pub hash_algorithm: HashAlgorithm,
    /// User allows the shell fallback.
    pub shell_fallback: bool,
    /// Time limit for shell fallback candidates.
    pub shell_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            hash_algorithm: HashAlgorithm::default(),
            shell_fallback: true,
            shell_timeout: Duration::from_secs(DEFAULT_SHELL_TIMEOUT_SECONDS),
        }
    }
}

fn invalid(key: &str, value: &Value) {
    tracing::warn!(setting = key, value = %value, "invalid setting value, using default");
}

impl Settings {
    /// Reads the settings from `host`; invalid values fall back to defaults.
    #[must_use]
    pub fn load(host: &dyn Host) -> Self {
        let mut settings = Self::default();

        if let Some(value) = host.setting(RUNTIME) {
            match value.as_str().map(str::trim) {
                Some(runtime) if !runtime.is_empty() => settings.runtime = runtime.to_string(),
                _ => invalid(RUNTIME, &value),
            }
        }
        if let Some(value) = host.setting(HASH_ALGORITHM) {
            match value.as_str().map(str::parse::<HashAlgorithm>) {
                Some(Ok(algorithm)) => settings.hash_algorithm = algorithm,
                _ => invalid(HASH_ALGORITHM, &value),
            }
        }
        if let Some(value) = host.setting(SHELL_FALLBACK) {
            match value.as_bool() {
                Some(enabled) => settings.shell_fallback = enabled,
                None => invalid(SHELL_FALLBACK, &value),
            }
        }
        if let Some(value) = host.setting(SHELL_TIMEOUT_SECONDS) {
            match value.as_u64() {
                Some(seconds) if seconds > 0 => {
                    settings.shell_timeout = Duration::from_secs(seconds);
                }
                _ => invalid(SHELL_TIMEOUT_SECONDS, &value),
            }
        }

        settings
    }
}
