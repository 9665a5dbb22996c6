//! `sigma-demo list` command.

use std::fmt::Write as _;

use crate::adapters::memory::MemoryHost;
use crate::ports::{Host, MenuContext};

/// Renders what the extension registered with `host` as plain-text tables.
///
/// Settings the user set explicitly are marked `(user)`, even when the
/// value matches the default.
#[must_use]
pub fn render(host: &MemoryHost) -> String {
    let mut out = String::from("Commands:\n");
    let commands = host.commands();
    let id_width = commands
        .iter()
        .map(|c| c.id.len())
        .max()
        .unwrap_or(2)
        .max(2);
    for command in &commands {
        let _ = writeln!(out, "  {:<id_width$}  {}", command.id, command.title);
    }

    out.push_str("\nContext menu:\n");
    let items = host.menu_items();
    let title_width = items
        .iter()
        .map(|i| i.title.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);
    for item in &items {
        let context = match &item.context {
            MenuContext::Files => "files".to_string(),
            MenuContext::Extension(ext) => format!("*.{ext}"),
        };
        let pad = " ".repeat(title_width - item.title.chars().count());
        let _ = writeln!(out, "  {}{pad}  {context:<8}  {}", item.title, item.command);
    }

    out.push_str("\nSettings:\n");
    let settings = host.settings();
    let key_width = settings
        .iter()
        .map(|s| s.key.len())
        .max()
        .unwrap_or(3)
        .max(3);
    for setting in &settings {
        let value = host
            .setting(&setting.key)
            .unwrap_or_else(|| setting.default.clone());
        let marker = if host.user_setting(&setting.key).is_some() {
            " (user)"
        } else {
            ""
        };
        let _ = writeln!(out, "  {:<key_width$}  {value}{marker}", setting.key);
    }
    out
}

/// Execute the `list` command.
pub fn run(host: &MemoryHost) {
    print!("{}", render(host));
}
