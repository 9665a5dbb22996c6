//! Host API port: everything the file manager provides to an extension.

use serde::{Deserialize, Serialize};

/// A command contributed by the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Unique command identifier (e.g. `sigma-demo.hash-files`).
    pub id: String,
    /// Title shown in the command palette.
    pub title: String,
    /// One-line description.
    pub description: String,
}

/// Where a context-menu item is offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuContext {
    /// Any selection of one or more files.
    Files,
    /// Files whose extension matches (without the leading dot).
    Extension(String),
}

/// A context-menu entry bound to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenuItem {
    /// Unique menu item identifier.
    pub id: String,
    /// Label shown in the menu.
    pub title: String,
    /// Command invoked when the item is chosen.
    pub command: String,
    /// Selection the item applies to.
    pub context: MenuContext,
}

/// Value type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    /// Free-form or enumerated text.
    String,
    /// On/off toggle.
    Boolean,
    /// Numeric value.
    Number,
}

/// A user-facing setting contributed by the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDefinition {
    /// Setting key (e.g. `sigma-demo.runtime`).
    pub key: String,
    /// Label shown in the settings page.
    pub title: String,
    /// Value type.
    pub kind: SettingKind,
    /// Value used when the user has not set one.
    pub default: serde_json::Value,
    /// Allowed values for enumerated string settings; empty means free-form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Informational message.
    Info,
    /// Something the user should notice, such as a cancellation.
    Warning,
    /// A failure.
    Error,
}

/// A transient toast-style notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
}

/// A dialog window; `modal` dialogs block the host UI until dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Window title.
    pub title: String,
    /// Main body text.
    pub message: String,
    /// Secondary text, such as which runtime produced the result.
    pub detail: Option<String>,
    /// Whether the dialog is modal.
    pub modal: bool,
}

/// A single progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// What is happening right now.
    pub description: String,
    /// Amount of progress to add, in percent.
    pub increment: f64,
}

/// Write-only progress channel; the most recent update wins for display.
pub trait ProgressSink: Send + Sync {
    /// Publishes a progress update.
    fn report(&self, update: ProgressUpdate);
}

/// The capabilities a host application exposes to an extension.
///
/// Passed into [`crate::extension::activate`] and every command handler so
/// that extensions never reach for global state.
pub trait Host: Send + Sync {
    /// Registers a command in the command palette.
    fn register_command(&self, command: CommandInfo);

    /// Adds an entry to the file context menu.
    fn register_context_menu_item(&self, item: ContextMenuItem);

    /// Declares a setting and its default value.
    fn register_setting(&self, setting: SettingDefinition);

    /// Returns the user's value for `key`, or the registered default.
    fn setting(&self, key: &str) -> Option<serde_json::Value>;

    /// Shows a notification.
    fn notify(&self, notification: Notification);

    /// Shows a dialog or modal.
    fn show_dialog(&self, dialog: Dialog);

    /// Opens a progress indicator titled `title`.
    fn progress(&self, title: &str) -> Box<dyn ProgressSink>;
}
