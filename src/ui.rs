use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::commands;
use crate::components::dialog::DialogWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::tree::node::find_item;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());
    let (tree_area, status_area) = (chunks[0], chunks[1]);

    let vault_name = app
        .vault
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| app.vault.root().display().to_string());
    let block = Block::default()
        .title(format!(" {} ", vault_name))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(137, 180, 250)))
        .title_style(Style::default().add_modifier(Modifier::BOLD));

    // The view measures itself from the inner area before it is drawn.
    app.sync_viewport(block.inner(tree_area));
    frame.render_widget(TreeWidget::new(&app.tree).block(block), tree_area);

    let (path_str, node_info) = focused_summary(app);
    let hints = commands::hints(&app.keymap, status_area.width as usize / 2);
    let mut status = StatusBarWidget::new(&path_str, &node_info, &hints);
    if !app.watcher_active {
        status = status.watcher_status("[watch off]");
    }
    if let Some((msg, _, is_error)) = &app.status_message {
        status = status.status_message(msg, *is_error);
    }
    frame.render_widget(status, status_area);

    if matches!(app.mode, AppMode::Dialog(_)) {
        frame.render_widget(DialogWidget::new(&app.mode, &app.dialog_state), frame.area());
    }
}

/// Path and a short description of the focused row, falling back to the
/// active note.
fn focused_summary(app: &App) -> (String, String) {
    match app.tree.focused_row() {
        Some(row) => {
            let children = find_item(app.tree.data(), &row.id).map_or(0, |i| i.children.len());
            let info = match children {
                0 => row.kind.label().to_string(),
                1 => format!("{} · 1 child", row.kind.label()),
                n => format!("{} · {} children", row.kind.label(), n),
            };
            (row.id.clone(), info)
        }
        None => (app.active_path.clone().unwrap_or_default(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppSettings;
    use crate::logging::NullLog;
    use crate::vault::DiskVault;
    use crate::view::{NavKey, NoopHandler, Viewport};
    use ratatui::{backend::TestBackend, Terminal};
    use std::fs::{self, File};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        File::create(dir.path().join("notes/a.md")).unwrap();
        File::create(dir.path().join("notes/a.b.md")).unwrap();
        let vault = DiskVault::new(dir.path(), Vec::new()).unwrap();
        let app = App::new(
            vault,
            AppSettings {
                use_icons: false,
                ..AppSettings::default()
            },
            Box::new(NoopHandler),
            Arc::new(NullLog),
            None,
            Viewport::new(10, 3),
        )
        .unwrap();
        (dir, app)
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut s = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                s.push_str(buf[(x, y)].symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn draw_sizes_the_view_to_the_tree_panel() {
        let (_dir, mut app) = setup_app();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        assert_eq!(app.tree_area.width, 58);
        assert_eq!(app.tree_area.height, 9);
        assert_eq!(app.tree.viewport().client_height, 9);
        let text = screen(&terminal);
        assert!(text.contains("[D] notes"));
        assert!(text.contains("q:quit") || text.contains("a:new"));
    }

    #[test]
    fn status_bar_describes_focused_row() {
        let (_dir, mut app) = setup_app();
        app.tree.expand("notes");
        app.tree.handle_key(NavKey::Down);
        app.tree.handle_key(NavKey::Down);
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen(&terminal).contains("notes/a.md"));
        assert!(screen(&terminal).contains("1 child"));
    }

    #[test]
    fn open_dialog_is_drawn_over_the_tree() {
        let (_dir, mut app) = setup_app();
        app.perform(crate::commands::Action::NewFolder);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen(&terminal).contains("New Folder"));
    }
}
