use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode, DialogKind};

/// Rows moved by one mouse wheel step.
const WHEEL_ROWS: isize = 3;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    match &app.mode {
        AppMode::Normal => {
            if let Some(action) = app.keymap.action_for(key) {
                app.perform(action);
            }
        }
        AppMode::Dialog(DialogKind::DeleteConfirm { .. }) => handle_confirm_key(app, key),
        AppMode::Dialog(DialogKind::Error { .. }) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.close_dialog();
            }
        }
        AppMode::Dialog(_) => handle_input_key(app, key),
    }
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_dialog(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
        _ => {}
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.close_dialog();
        }
        return;
    }
    match key.code {
        KeyCode::Enter => app.confirm_dialog(),
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

/// Handle a mouse event. Only the tree panel reacts, and only in normal mode.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.mode != AppMode::Normal {
        return;
    }
    let area = app.tree_area;
    let inside = mouse.column >= area.x
        && mouse.column < area.x + area.width
        && mouse.row >= area.y
        && mouse.row < area.y + area.height;
    if !inside {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let y = (mouse.row - area.y) as usize;
            if let Some(index) = app.tree.index_at(y) {
                app.tree.click(index);
            }
        }
        MouseEventKind::ScrollDown => app.tree.scroll_rows(WHEEL_ROWS),
        MouseEventKind::ScrollUp => app.tree.scroll_rows(-WHEEL_ROWS),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppSettings;
    use crate::logging::NullLog;
    use crate::vault::DiskVault;
    use crate::view::{NoopHandler, Viewport};
    use pretty_assertions::assert_eq;
    use ratatui::layout::Rect;
    use std::fs::{self, File};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_app(files: &[&str]) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        for name in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            File::create(path).unwrap();
        }
        let vault = DiskVault::new(dir.path(), Vec::new()).unwrap();
        let mut app = App::new(
            vault,
            AppSettings::default(),
            Box::new(NoopHandler),
            Arc::new(NullLog),
            None,
            Viewport::new(40, 5),
        )
        .unwrap();
        app.tree_area = Rect::new(1, 1, 40, 5);
        (dir, app)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn typing_a_note_name_creates_it() {
        let (dir, mut app) = setup_app(&["a.md"]);
        press(&mut app, KeyCode::Char('a'));
        for c in "b".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(dir.path().join("b.md").exists());
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn escape_cancels_input_dialog() {
        let (dir, mut app) = setup_app(&["a.md"]);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.should_quit);
        assert!(!dir.path().join("q.md").exists());
    }

    #[test]
    fn delete_needs_y_to_confirm() {
        let (dir, mut app) = setup_app(&["a.md", "b.md"]);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('x'));
        assert!(dir.path().join("a.md").exists());
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, AppMode::Normal);
        assert!(dir.path().join("a.md").exists());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(!dir.path().join("a.md").exists());
    }

    #[test]
    fn error_dialog_is_dismissed_with_enter() {
        let (_dir, mut app) = setup_app(&["a.md"]);
        app.open_dialog(
            DialogKind::Error {
                message: "boom".into(),
            },
            String::new(),
        );
        press(&mut app, KeyCode::Char('x'));
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::Error { .. })));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn click_selects_leaf_and_toggles_branch() {
        let (_dir, mut app) = setup_app(&["notes/x.md", "top.md"]);
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 2));
        assert_eq!(app.tree.selection_id(), Some("top.md"));

        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        assert!(app.tree.is_expanded("notes"));
        assert_eq!(app.tree.len(), 3);
    }

    #[test]
    fn clicks_outside_the_tree_are_ignored() {
        let (_dir, mut app) = setup_app(&["a.md"]);
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 0, 0));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 30));
        assert_eq!(app.tree.selection_id(), None);
    }

    #[test]
    fn wheel_scrolls_the_tree() {
        let names: Vec<String> = (0..20).map(|i| format!("n{:02}.md", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (_dir, mut app) = setup_app(&refs);
        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollDown, 5, 3));
        app.tick();
        assert_eq!(app.tree.viewport().scroll_top, 3);
        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollUp, 5, 3));
        app.tick();
        assert_eq!(app.tree.viewport().scroll_top, 0);
    }

    #[test]
    fn mouse_is_ignored_while_a_dialog_is_open() {
        let (_dir, mut app) = setup_app(&["a.md"]);
        press(&mut app, KeyCode::Char('a'));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        assert_eq!(app.tree.selection_id(), None);
    }
}
