use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::tree::{FlatRow, NodeKind};

/// State-dependent decoration of a bound row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFlags {
    pub focused: bool,
    pub selected: bool,
    pub expanded: bool,
}

/// A pooled row element, rebound to different rows as the window moves.
#[derive(Debug, Clone)]
pub struct RowSlot {
    pub bound_id: Option<String>,
    pub index: Option<usize>,
    /// Vertical offset of the row in the scroll content.
    pub offset: usize,
    pub hidden: bool,
    /// Forces a full rebuild on the next bind.
    pub dirty: bool,
    pub flags: RowFlags,
    pub content: Line<'static>,
}

impl Default for RowSlot {
    fn default() -> Self {
        Self {
            bound_id: None,
            index: None,
            offset: 0,
            hidden: true,
            dirty: true,
            flags: RowFlags::default(),
            content: Line::default(),
        }
    }
}

impl RowSlot {
    pub fn hide(&mut self) {
        self.hidden = true;
        self.index = None;
    }

    pub fn is_bound_to(&self, id: &str) -> bool {
        self.bound_id.as_deref() == Some(id)
    }
}

/// Row rendering policy.
pub trait RowRenderer {
    /// Build the slot content from scratch.
    fn build(&self, row: &FlatRow, slot: &mut RowSlot);

    /// Update the decoration of a slot still bound to the same row.
    fn refresh(&self, row: &FlatRow, slot: &mut RowSlot);
}

/// Receives activation of rows.
pub trait RowEventHandler {
    /// A branch was toggled or activated.
    fn on_open(&mut self, row: &FlatRow);
    /// A leaf was activated.
    fn on_select(&mut self, row: &FlatRow);
}

/// Handler that ignores activations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl RowEventHandler for NoopHandler {
    fn on_open(&mut self, _row: &FlatRow) {}
    fn on_select(&mut self, _row: &FlatRow) {}
}

/// Renders rows as a single styled line: indent, caret, icon, name.
#[derive(Debug, Clone)]
pub struct LineRenderer {
    use_icons: bool,
    indent: usize,
}

impl Default for LineRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Index of the caret span in a built line.
const CARET_SPAN: usize = 1;

impl LineRenderer {
    pub fn new(use_icons: bool) -> Self {
        Self {
            use_icons,
            indent: 2,
        }
    }

    fn caret(row: &FlatRow, expanded: bool) -> &'static str {
        match (row.has_children, expanded) {
            (false, _) => "  ",
            (true, true) => "▾ ",
            (true, false) => "▸ ",
        }
    }

    fn icon(&self, row: &FlatRow, expanded: bool) -> &'static str {
        if self.use_icons {
            match row.kind {
                NodeKind::Folder if expanded => "\u{f07c} ",
                NodeKind::Folder => "\u{f07b} ",
                NodeKind::Virtual => "\u{f10c} ",
                NodeKind::File => "\u{f15b} ",
            }
        } else {
            match row.kind {
                NodeKind::Folder => "[D] ",
                NodeKind::Virtual => "[V] ",
                NodeKind::File => "[F] ",
            }
        }
    }

    fn style(row: &FlatRow, flags: RowFlags) -> Style {
        let base = match row.kind {
            NodeKind::Folder => Style::default()
                .fg(Color::Rgb(137, 180, 250))
                .add_modifier(Modifier::BOLD),
            NodeKind::Virtual => Style::default()
                .fg(Color::Rgb(108, 112, 134))
                .add_modifier(Modifier::ITALIC),
            NodeKind::File => Style::default().fg(Color::Rgb(205, 214, 244)),
        };
        let base = if flags.selected {
            base.fg(Color::Rgb(166, 227, 161)).add_modifier(Modifier::BOLD)
        } else {
            base
        };
        if flags.focused {
            base.bg(Color::Rgb(69, 71, 90))
        } else {
            base
        }
    }
}

impl RowRenderer for LineRenderer {
    fn build(&self, row: &FlatRow, slot: &mut RowSlot) {
        let expanded = slot.flags.expanded;
        let spans = vec![
            Span::raw(" ".repeat(row.level * self.indent)),
            Span::raw(Self::caret(row, expanded)),
            Span::raw(self.icon(row, expanded)),
            Span::raw(row.name.clone()),
        ];
        slot.content = Line::from(spans).style(Self::style(row, slot.flags));
    }

    fn refresh(&self, row: &FlatRow, slot: &mut RowSlot) {
        let expanded = slot.flags.expanded;
        if slot.content.spans.len() <= CARET_SPAN + 1 {
            self.build(row, slot);
            return;
        }
        slot.content.spans[CARET_SPAN] = Span::raw(Self::caret(row, expanded));
        slot.content.spans[CARET_SPAN + 1] = Span::raw(self.icon(row, expanded));
        slot.content.style = Self::style(row, slot.flags);
    }
}
