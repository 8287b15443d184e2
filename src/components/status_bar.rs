use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

const STATUS_FG: Color = Color::Rgb(205, 214, 244);
const INFO_FG: Color = Color::Rgb(137, 180, 250);
const SUCCESS_FG: Color = Color::Rgb(166, 227, 161);
const ERROR_BG: Color = Color::Rgb(243, 139, 168);
const WARNING_FG: Color = Color::Rgb(249, 226, 175);
const DIM_FG: Color = Color::Rgb(108, 112, 134);

/// Status bar: focused path, node info and key hints, or a transient notice.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    node_info: &'a str,
    hints: &'a str,
    status_message: Option<&'a str>,
    is_error: bool,
    watcher_status: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, node_info: &'a str, hints: &'a str) -> Self {
        Self {
            path_str,
            node_info,
            hints,
            status_message: None,
            is_error: false,
            watcher_status: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn watcher_status(mut self, status: &'a str) -> Self {
        self.watcher_status = Some(status);
        self
    }
}

fn width_of(s: &str) -> usize {
    s.chars().count()
}

/// First `n` characters of `s`.
fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Last `n` characters of `s`.
fn tail(s: &str, n: usize) -> String {
    let skip = width_of(s).saturating_sub(n);
    s.chars().skip(skip).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default().bg(ERROR_BG).fg(STATUS_FG)
            } else {
                Style::default().fg(SUCCESS_FG)
            };
            let display = format!("{:<width$}", head(msg, width), width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [path] [node_info] [watcher] [hints]
        let hints_len = width_of(self.hints);
        let watcher_len = self.watcher_status.map_or(0, |w| width_of(w) + 1);
        let remaining = width.saturating_sub(hints_len).saturating_sub(watcher_len);

        let info_len = width_of(self.node_info);
        let path_budget = remaining.saturating_sub(info_len).saturating_sub(1);

        let path_display = if width_of(self.path_str) > path_budget {
            if path_budget > 3 {
                format!("...{}", tail(self.path_str, path_budget - 3))
            } else {
                head(self.path_str, path_budget)
            }
        } else {
            self.path_str.to_string()
        };
        let info_display = head(
            self.node_info,
            remaining.saturating_sub(width_of(&path_display)),
        );
        let gap = remaining
            .saturating_sub(width_of(&path_display))
            .saturating_sub(width_of(&info_display));

        let mut spans = vec![
            Span::styled(path_display, Style::default().fg(STATUS_FG)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, Style::default().fg(INFO_FG)),
        ];

        if let Some(watcher_str) = self.watcher_status {
            let watcher_style = Style::default()
                .fg(WARNING_FG)
                .add_modifier(Modifier::BOLD);
            spans.push(Span::raw(" "));
            spans.push(Span::styled(watcher_str.to_string(), watcher_style));
        }

        let hints_style = Style::default().fg(DIM_FG).add_modifier(Modifier::DIM);
        spans.push(Span::styled(self.hints.to_string(), hints_style));

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
