use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Paragraph, Widget},
};

use crate::view::VirtualTree;

/// Draws the pooled rows of a [`VirtualTree`] that fall inside the viewport.
pub struct TreeWidget<'a> {
    tree: &'a VirtualTree,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(tree: &'a VirtualTree) -> Self {
        Self { tree, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner_area.height == 0 || inner_area.width == 0 {
            return;
        }

        let viewport = self.tree.viewport();
        let row_height = self.tree.options().row_height.max(1);
        let scroll_left = u16::try_from(viewport.scroll_left).unwrap_or(u16::MAX);

        for slot in self.tree.visible_slots() {
            // Buffer rows above the viewport are laid out but not drawn.
            let Some(y) = slot.offset.checked_sub(viewport.scroll_top) else {
                continue;
            };
            if y >= inner_area.height as usize {
                continue;
            }
            let height = row_height.min(inner_area.height as usize - y);
            let row_area = Rect::new(
                inner_area.x,
                inner_area.y + y as u16,
                inner_area.width,
                height as u16,
            );
            buf.set_style(row_area, slot.content.style);
            Paragraph::new(slot.content.clone())
                .scroll((0, scroll_left))
                .render(row_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::fixtures::{file, folder};
    use crate::view::engine::tests::mounted;
    use crate::view::NavKey;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn draw(tree: &VirtualTree, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(tree).render(area, &mut buf);
        buf
    }

    #[test]
    fn draws_rows_at_their_viewport_position() {
        let (tree, _) = mounted(
            vec![folder("a", vec![file("a/x.md")]), file("b.md")],
            5,
        );
        let buf = draw(&tree, 40, 5);
        assert_eq!(row_text(&buf, 0), "▸ [D] a");
        assert_eq!(row_text(&buf, 1), "  [F] b.md");
        assert_eq!(row_text(&buf, 2), "");
    }

    #[test]
    fn scrolled_rows_start_at_the_top() {
        let data: Vec<_> = (0..30).map(|i| file(&format!("f{:02}.md", i))).collect();
        let (mut tree, _) = mounted(data, 5);
        tree.on_scroll(10);
        tree.run_frame();
        let buf = draw(&tree, 40, 5);
        assert_eq!(row_text(&buf, 0), "  [F] f10.md");
        assert_eq!(row_text(&buf, 4), "  [F] f14.md");
    }

    #[test]
    fn horizontal_scroll_shifts_content() {
        let (mut tree, _) = mounted(vec![file(&format!("{}.md", "x".repeat(60)))], 5);
        tree.scroll_horizontal(6);
        let buf = draw(&tree, 40, 5);
        assert!(row_text(&buf, 0).starts_with("xxxx"));
    }

    #[test]
    fn focused_row_carries_its_style() {
        let (mut tree, _) = mounted(vec![file("a.md"), file("b.md")], 5);
        tree.handle_key(NavKey::Down);
        tree.handle_key(NavKey::Down);
        let buf = draw(&tree, 40, 5);
        let focused_bg = tree.visible_slots().find(|s| s.flags.focused).map(|s| s.content.style.bg);
        assert_eq!(Some(buf[(30, 1)].style().bg), focused_bg);
        assert_ne!(buf[(30, 0)].style().bg, buf[(30, 1)].style().bg);
    }

    #[test]
    fn empty_area_draws_nothing() {
        let (tree, _) = mounted(vec![file("a.md")], 5);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&tree).render(area, &mut buf);
    }
}
