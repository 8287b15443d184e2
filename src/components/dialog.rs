use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::tree::{NodeKind, ROOT};

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState) -> Self {
        Self { mode, dialog_state }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }
}

fn folder_label(folder: &str) -> String {
    if folder == ROOT {
        "in vault root".to_string()
    } else {
        format!("in {}/", folder)
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::CreateNote { folder } => {
                render_input_dialog("New Note", &folder_label(folder), self.dialog_state, area, buf);
            }
            DialogKind::CreateFolder { parent } => {
                render_input_dialog("New Folder", &folder_label(parent), self.dialog_state, area, buf);
            }
            DialogKind::Rename { original, kind } => {
                let title = match kind {
                    NodeKind::Folder => "Rename Folder",
                    NodeKind::Virtual => "Rename Note Family",
                    NodeKind::File => "Rename Note",
                };
                render_input_dialog(title, original, self.dialog_state, area, buf);
            }
            DialogKind::DeleteConfirm {
                target,
                descendants,
            } => {
                render_confirm_dialog(target, *descendants, area, buf);
            }
            DialogKind::Error { message } => {
                render_error_dialog(message, area, buf);
            }
        }
    }
}

fn hint_line(hint: &str) -> Line<'_> {
    let hint_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);
    Line::from(Span::styled(hint, hint_style))
}

fn render_input_dialog(
    title: &str,
    context: &str,
    state: &DialogState,
    area: Rect,
    buf: &mut Buffer,
) {
    let dialog_width = 50.min(area.width.saturating_sub(4));
    let dialog_height = 6;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let context_line = Line::from(Span::styled(context, Style::default().fg(Color::Gray)));
    buf.set_line(inner.x, inner.y, &context_line, inner.width);

    // Input line with the cursor drawn as an inverted cell
    let input = &state.input;
    let cursor_pos = Some(state.cursor_position)
        .filter(|&pos| input.is_char_boundary(pos))
        .unwrap_or(input.len());
    let max_width = inner.width as usize;

    let before = &input[..cursor_pos];
    let mut rest = input[cursor_pos..].chars();
    let cursor_char = rest.next().map_or(" ".to_string(), |c| c.to_string());
    let after: String = rest.collect();

    // Keep the cursor in view by dropping characters on the left
    let before_len = before.chars().count();
    let keep = max_width.saturating_sub(2);
    let before_display: String = if before_len > keep {
        before.chars().skip(before_len - keep).collect()
    } else {
        before.to_string()
    };

    let input_style = Style::default().fg(Color::White);
    let cursor_style = Style::default()
        .bg(Color::White)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(before_display, input_style),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, input_style),
    ]);
    if inner.height > 1 {
        buf.set_line(inner.x, inner.y + 1, &line, inner.width);
    }

    if inner.height > 2 {
        let hint = hint_line("[Enter] Confirm  [Esc] Cancel");
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
    }
}

fn render_confirm_dialog(target: &str, descendants: usize, area: Rect, buf: &mut Buffer) {
    let dialog_width = (target.chars().count() as u16 + 10)
        .max(40)
        .min(area.width.saturating_sub(4));
    let dialog_height = 7.min(area.height.saturating_sub(2));
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Delete Confirmation ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header = Line::from(Span::styled(
        "Delete this entry?",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    buf.set_line(inner.x, inner.y, &header, inner.width);

    let mut lines = vec![Line::from(Span::styled(
        format!("  • {}", target),
        Style::default().fg(Color::White),
    ))];
    if descendants > 0 {
        let noun = if descendants == 1 { "entry" } else { "entries" };
        lines.push(Line::from(Span::styled(
            format!("    and {} nested {} shown below it", descendants, noun),
            Style::default().fg(Color::Gray),
        )));
    }
    let room = inner.height.saturating_sub(3) as usize;
    for (i, line) in lines.iter().take(room).enumerate() {
        buf.set_line(inner.x, inner.y + 2 + i as u16, line, inner.width);
    }

    let hint = hint_line("[y] Yes  [n/Esc] Cancel");
    buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
}

fn render_error_dialog(message: &str, area: Rect, buf: &mut Buffer) {
    let dialog_width = (message.chars().count() as u16 + 6)
        .max(30)
        .min(area.width.saturating_sub(4));
    let dialog_height = 5;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let msg_line = Line::from(Span::styled(message, Style::default().fg(Color::Red)));
    buf.set_line(inner.x, inner.y + inner.height / 2, &msg_line, inner.width);

    if inner.height > 1 {
        let hint = hint_line("[Enter/Esc] Dismiss");
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
    }
}
