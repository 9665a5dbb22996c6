//! Console host: the CLI's stand-in for the file manager.
//!
//! Registrations are kept in memory, user settings come from a YAML file,
//! dialogs and notifications are printed.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::adapters::memory::MemoryHost;
use crate::ports::{
    CommandInfo, ContextMenuItem, Dialog, Host, Notification, NotificationLevel, ProgressSink,
    ProgressUpdate, SettingDefinition,
};

/// Host that prints to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    inner: MemoryHost,
}

impl ConsoleHost {
    /// Creates a host with no user settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host whose user settings are read from a YAML mapping at `path`.
    ///
    /// A missing or empty file means "no user settings".
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_settings_file(path: &Path) -> Result<Self, String> {
        let host = Self::new();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(host);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file {}: {e}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(host);
        }
        let values: HashMap<String, serde_json::Value> = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse settings file {}: {e}", path.display()))?;
        for (key, value) in values {
            host.inner.set_setting(&key, value);
        }
        Ok(host)
    }

    /// Everything registered and shown so far.
    #[must_use]
    pub fn state(&self) -> &MemoryHost {
        &self.inner
    }
}

impl Host for ConsoleHost {
    fn register_command(&self, command: CommandInfo) {
        tracing::debug!(id = %command.id, "command registered");
        self.inner.register_command(command);
    }

    fn register_context_menu_item(&self, item: ContextMenuItem) {
        tracing::debug!(id = %item.id, command = %item.command, "context menu item registered");
        self.inner.register_context_menu_item(item);
    }

    fn register_setting(&self, setting: SettingDefinition) {
        self.inner.register_setting(setting);
    }

    fn setting(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.setting(key)
    }

    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => println!("{}: {}", notification.title, notification.message),
            NotificationLevel::Warning => {
                eprintln!("warning: {}: {}", notification.title, notification.message);
            }
            NotificationLevel::Error => {
                eprintln!("error: {}: {}", notification.title, notification.message);
            }
        }
        self.inner.notify(notification);
    }

    fn show_dialog(&self, dialog: Dialog) {
        println!("== {} ==", dialog.title);
        println!("{}", dialog.message);
        if let Some(detail) = &dialog.detail {
            println!("({detail})");
        }
        self.inner.show_dialog(dialog);
    }

    fn progress(&self, title: &str) -> Box<dyn ProgressSink> {
        Box::new(ConsoleProgress {
            title: title.to_string(),
            last: Mutex::new(String::new()),
        })
    }
}

/// Prints a progress line whenever the description changes.
struct ConsoleProgress {
    title: String,
    last: Mutex<String>,
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, update: ProgressUpdate) {
        tracing::trace!(
            title = %self.title,
            description = %update.description,
            increment = update.increment
        );
        let mut last = self.last.lock().expect("progress lock poisoned");
        if *last != update.description {
            eprintln!("{}: {}", self.title, update.description);
            last.clone_from(&update.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let host = ConsoleHost::from_settings_file(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(host.setting("sigma-demo.runtime"), None);
    }

    #[test]
    fn reads_user_settings_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "sigma-demo.runtime: bun\nsigma-demo.shellTimeoutSeconds: 5\n",
        )
        .unwrap();

        let host = ConsoleHost::from_settings_file(&path).unwrap();
        assert_eq!(host.setting("sigma-demo.runtime"), Some(json!("bun")));
        assert_eq!(host.setting("sigma-demo.shellTimeoutSeconds"), Some(json!(5)));
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();

        let err = ConsoleHost::from_settings_file(&path).unwrap_err();
        assert!(err.contains("Failed to parse settings file"));
    }

    #[test]
    fn dialogs_are_kept_after_printing() {
        let host = ConsoleHost::new();
        host.show_dialog(Dialog {
            title: "Hashes".into(),
            message: "abc  file.txt".into(),
            detail: None,
            modal: false,
        });
        assert_eq!(host.state().dialogs().len(), 1);
    }
}
