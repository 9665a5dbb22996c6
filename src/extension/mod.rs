//! The demo extension: what it registers with the host and how its
//! commands are carried out.

pub mod handlers;
pub mod output;
pub mod settings;

pub use handlers::{Extension, Invocation};
pub use settings::Settings;

use crate::ports::{CommandInfo, ContextMenuItem, Host, MenuContext};

/// Commands contributed by the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionCommand {
    /// Hash the selected files.
    HashFiles,
    /// Evaluate an expression over a JSON document.
    TransformJson,
    /// Show facts about the machine.
    SystemInfo,
    /// Show the configured runtime's version.
    RuntimeInfo,
}

impl ExtensionCommand {
    /// Every command, in palette order.
    pub const ALL: [Self; 4] = [
        Self::HashFiles,
        Self::TransformJson,
        Self::SystemInfo,
        Self::RuntimeInfo,
    ];

    /// Command identifier registered with the host.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::HashFiles => "sigma-demo.hash-files",
            Self::TransformJson => "sigma-demo.transform-json",
            Self::SystemInfo => "sigma-demo.system-info",
            Self::RuntimeInfo => "sigma-demo.runtime-info",
        }
    }

    /// Looks a command up by identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }

    fn info(self) -> CommandInfo {
        let (title, description) = match self {
            Self::HashFiles => (
                "Compute file hash",
                "Hash the selected files with the configured algorithm",
            ),
            Self::TransformJson => (
                "Transform JSON",
                "Evaluate an expression over a JSON document",
            ),
            Self::SystemInfo => ("System information", "Show platform, memory and uptime"),
            Self::RuntimeInfo => (
                "Runtime information",
                "Show the configured JavaScript runtime's version",
            ),
        };
        CommandInfo {
            id: self.id().into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// How a command invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The result was shown to the user.
    Succeeded,
    /// An error notification was shown; carries its message.
    Failed(String),
    /// The user cancelled; nothing but a warning was shown.
    Cancelled,
}

fn menu_items() -> Vec<ContextMenuItem> {
    vec![
        ContextMenuItem {
            id: "sigma-demo.menu.hash".into(),
            title: "Compute file hash".into(),
            command: ExtensionCommand::HashFiles.id().into(),
            context: MenuContext::Files,
        },
        ContextMenuItem {
            id: "sigma-demo.menu.transform-json".into(),
            title: "Transform JSON\u{2026}".into(),
            command: ExtensionCommand::TransformJson.id().into(),
            context: MenuContext::Extension("json".into()),
        },
    ]
}

/// Registers the extension's settings, commands and menu items with `host`.
pub fn activate(host: &dyn Host) {
    for definition in settings::definitions() {
        host.register_setting(definition);
    }
    for command in ExtensionCommand::ALL {
        host.register_command(command.info());
    }
    for item in menu_items() {
        host.register_context_menu_item(item);
    }
    tracing::debug!("extension activated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryHost;

    #[test]
    fn activation_registers_everything() {
        let host = MemoryHost::new();
        activate(&host);

        let ids: Vec<String> = host.commands().into_iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec![
                "sigma-demo.hash-files",
                "sigma-demo.transform-json",
                "sigma-demo.system-info",
                "sigma-demo.runtime-info"
            ]
        );
        assert_eq!(host.settings().len(), 4);
        assert_eq!(host.setting(settings::RUNTIME), Some(serde_json::json!("node")));

        let menu = host.menu_items();
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[1].context, MenuContext::Extension("json".into()));
        assert!(menu
            .iter()
            .all(|item| ExtensionCommand::from_id(&item.command).is_some()));
    }

    #[test]
    fn unknown_command_id_is_rejected() {
        assert_eq!(ExtensionCommand::from_id("sigma-demo.delete-everything"), None);
        assert_eq!(
            ExtensionCommand::from_id("sigma-demo.system-info"),
            Some(ExtensionCommand::SystemInfo)
        );
    }
}
