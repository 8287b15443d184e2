//! Key bindings and the command catalog shown in the status bar.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::view::NavKey;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Nav(NavKey),
    NewNote,
    NewChild,
    NewFolder,
    Materialize,
    Rename,
    Delete,
    Refresh,
    RevealActive,
    ToggleWatcher,
    ScrollLeft,
    ScrollRight,
}

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// Key label for hints.
    pub key: &'static str,
    /// Label for hints.
    pub short: &'static str,
}

/// Lists the commands available to the user.
pub trait CommandCatalog {
    fn list(&self) -> Vec<CommandInfo>;
}

const COMMANDS: &[(Action, CommandInfo)] = &[
    (
        Action::NewNote,
        CommandInfo {
            id: "note.create",
            name: "New note",
            key: "a",
            short: "new",
        },
    ),
    (
        Action::NewChild,
        CommandInfo {
            id: "note.create-child",
            name: "New child note",
            key: "c",
            short: "child",
        },
    ),
    (
        Action::NewFolder,
        CommandInfo {
            id: "folder.create",
            name: "New folder",
            key: "A",
            short: "dir",
        },
    ),
    (
        Action::Rename,
        CommandInfo {
            id: "node.rename",
            name: "Rename",
            key: "r",
            short: "ren",
        },
    ),
    (
        Action::Delete,
        CommandInfo {
            id: "node.delete",
            name: "Delete",
            key: "d",
            short: "del",
        },
    ),
    (
        Action::Materialize,
        CommandInfo {
            id: "virtual.materialize",
            name: "Create file for virtual note",
            key: "m",
            short: "mat",
        },
    ),
    (
        Action::RevealActive,
        CommandInfo {
            id: "tree.reveal",
            name: "Reveal active note",
            key: "f",
            short: "reveal",
        },
    ),
    (
        Action::Refresh,
        CommandInfo {
            id: "tree.refresh",
            name: "Rebuild tree",
            key: "R",
            short: "rebuild",
        },
    ),
    (
        Action::ToggleWatcher,
        CommandInfo {
            id: "watcher.toggle",
            name: "Toggle auto-refresh",
            key: "w",
            short: "watch",
        },
    ),
    (
        Action::Quit,
        CommandInfo {
            id: "app.quit",
            name: "Quit",
            key: "q",
            short: "quit",
        },
    ),
];

/// The built-in key bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keymap;

impl Keymap {
    pub fn action_for(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Action::Quit),
                KeyCode::Char('d') => Some(Action::Nav(NavKey::PageDown)),
                KeyCode::Char('u') => Some(Action::Nav(NavKey::PageUp)),
                _ => None,
            };
        }
        let action = match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => Action::Nav(NavKey::Up),
            KeyCode::Down | KeyCode::Char('j') => Action::Nav(NavKey::Down),
            KeyCode::Left | KeyCode::Char('h') => Action::Nav(NavKey::Left),
            KeyCode::Right | KeyCode::Char('l') => Action::Nav(NavKey::Right),
            KeyCode::Home | KeyCode::Char('g') => Action::Nav(NavKey::Home),
            KeyCode::End | KeyCode::Char('G') => Action::Nav(NavKey::End),
            KeyCode::PageUp => Action::Nav(NavKey::PageUp),
            KeyCode::PageDown => Action::Nav(NavKey::PageDown),
            KeyCode::Enter => Action::Nav(NavKey::Enter),
            KeyCode::Char(' ') => Action::Nav(NavKey::Space),
            KeyCode::Char('a') => Action::NewNote,
            KeyCode::Char('c') => Action::NewChild,
            KeyCode::Char('A') => Action::NewFolder,
            KeyCode::Char('m') => Action::Materialize,
            KeyCode::Char('r') | KeyCode::F(2) => Action::Rename,
            KeyCode::Char('d') | KeyCode::Delete => Action::Delete,
            KeyCode::Char('R') | KeyCode::F(5) => Action::Refresh,
            KeyCode::Char('f') => Action::RevealActive,
            KeyCode::Char('w') => Action::ToggleWatcher,
            KeyCode::Char('<') => Action::ScrollLeft,
            KeyCode::Char('>') => Action::ScrollRight,
            _ => return None,
        };
        Some(action)
    }
}

impl CommandCatalog for Keymap {
    fn list(&self) -> Vec<CommandInfo> {
        COMMANDS.iter().map(|(_, info)| *info).collect()
    }
}

/// Compact `key:name` hints that fit in `width` columns.
pub fn hints(catalog: &dyn CommandCatalog, width: usize) -> String {
    let mut out = String::new();
    for info in catalog.list() {
        let entry = format!(" {}:{} ", info.key, info.short);
        if out.len() + entry.len() > width {
            break;
        }
        out.push_str(&entry);
    }
    out
}
