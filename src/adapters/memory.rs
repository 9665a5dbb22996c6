//! In-memory host that keeps everything the extension hands to it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ports::{
    CommandInfo, ContextMenuItem, Dialog, Host, Notification, ProgressSink, ProgressUpdate,
    SettingDefinition,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("memory host lock poisoned")
}

/// Progress sink that keeps every update; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgress {
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

impl MemoryProgress {
    /// Updates received so far, oldest first.
    #[must_use]
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        lock(&self.updates).clone()
    }
}

impl ProgressSink for MemoryProgress {
    fn report(&self, update: ProgressUpdate) {
        lock(&self.updates).push(update);
    }
}

/// Host that records registrations and UI calls instead of showing them.
#[derive(Debug, Default)]
pub struct MemoryHost {
    commands: Mutex<Vec<CommandInfo>>,
    menu_items: Mutex<Vec<ContextMenuItem>>,
    settings: Mutex<Vec<SettingDefinition>>,
    values: Mutex<HashMap<String, serde_json::Value>>,
    notifications: Mutex<Vec<Notification>>,
    dialogs: Mutex<Vec<Dialog>>,
    progress: MemoryProgress,
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a user value for `key`, overriding the registered default.
    #[must_use]
    pub fn with_setting(self, key: &str, value: serde_json::Value) -> Self {
        self.set_setting(key, value);
        self
    }

    /// Sets a user value for `key`.
    pub fn set_setting(&self, key: &str, value: serde_json::Value) {
        lock(&self.values).insert(key.to_string(), value);
    }

    /// The user's own value for `key`, ignoring registered defaults.
    #[must_use]
    pub fn user_setting(&self, key: &str) -> Option<serde_json::Value> {
        lock(&self.values).get(key).cloned()
    }

    /// Registered commands.
    #[must_use]
    pub fn commands(&self) -> Vec<CommandInfo> {
        lock(&self.commands).clone()
    }

    /// Registered context-menu items.
    #[must_use]
    pub fn menu_items(&self) -> Vec<ContextMenuItem> {
        lock(&self.menu_items).clone()
    }

    /// Registered setting definitions.
    #[must_use]
    pub fn settings(&self) -> Vec<SettingDefinition> {
        lock(&self.settings).clone()
    }

    /// Notifications shown so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    /// Dialogs shown so far.
    #[must_use]
    pub fn dialogs(&self) -> Vec<Dialog> {
        lock(&self.dialogs).clone()
    }

    /// Progress reported through every sink this host handed out.
    #[must_use]
    pub fn progress_updates(&self) -> Vec<ProgressUpdate> {
        self.progress.updates()
    }
}

impl Host for MemoryHost {
    fn register_command(&self, command: CommandInfo) {
        lock(&self.commands).push(command);
    }

    fn register_context_menu_item(&self, item: ContextMenuItem) {
        lock(&self.menu_items).push(item);
    }

    fn register_setting(&self, setting: SettingDefinition) {
        let mut settings = lock(&self.settings);
        settings.retain(|existing| existing.key != setting.key);
        settings.push(setting);
    }

    fn setting(&self, key: &str) -> Option<serde_json::Value> {
        if let Some(value) = lock(&self.values).get(key) {
            return Some(value.clone());
        }
        lock(&self.settings).iter().find(|s| s.key == key).map(|s| s.default.clone())
    }

    fn notify(&self, notification: Notification) {
        lock(&self.notifications).push(notification);
    }

    fn show_dialog(&self, dialog: Dialog) {
        lock(&self.dialogs).push(dialog);
    }

    fn progress(&self, _title: &str) -> Box<dyn ProgressSink> {
        Box::new(self.progress.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ports::SettingKind;

    fn definition(key: &str, default: serde_json::Value) -> SettingDefinition {
        SettingDefinition {
            key: key.into(),
            title: key.into(),
            kind: SettingKind::String,
            default,
            options: Vec::new(),
        }
    }

    #[test]
    fn user_value_overrides_default() {
        let host = MemoryHost::new().with_setting("runtime", json!("bun"));
        host.register_setting(definition("runtime", json!("node")));
        host.register_setting(definition("algorithm", json!("sha256")));

        assert_eq!(host.setting("runtime"), Some(json!("bun")));
        assert_eq!(host.setting("algorithm"), Some(json!("sha256")));
        assert_eq!(host.setting("missing"), None);
    }

    #[test]
    fn re_registering_a_setting_replaces_it() {
        let host = MemoryHost::new();
        host.register_setting(definition("runtime", json!("node")));
        host.register_setting(definition("runtime", json!("deno")));
        assert_eq!(host.settings().len(), 1);
        assert_eq!(host.setting("runtime"), Some(json!("deno")));
    }

    #[test]
    fn progress_sinks_share_one_log() {
        let host = MemoryHost::new();
        host.progress("a").report(ProgressUpdate {
            description: "one".into(),
            increment: 1.0,
        });
        host.progress("b").report(ProgressUpdate {
            description: "two".into(),
            increment: 2.0,
        });
        let descriptions: Vec<String> = host
            .progress_updates()
            .into_iter()
            .map(|u| u.description)
            .collect();
        assert_eq!(descriptions, vec!["one", "two"]);
    }
}
