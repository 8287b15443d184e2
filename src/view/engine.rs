//! Virtualized tree view.
//!
//! `VirtualTree` owns the view data, its flattened projection and a pool of
//! row slots. Only rows inside the visible window (plus a buffer on each
//! side) are bound to slots; scrolling rebinds slots instead of creating new
//! ones. Expansion changes keep the selected and focused ids and the row at
//! the top of the viewport stable.

use std::sync::Arc;

use thiserror::Error;

use super::row::{RowEventHandler, RowFlags, RowRenderer, RowSlot};
use super::window::{compute_window, max_scroll, required_pool_size, VisibleWindow};
use crate::logging::LogPort;
use crate::tree::node::parent_map_of;
use crate::tree::patch::{self, PatchOutcome};
use crate::tree::{flatten, ExpansionState, FlatRow, NoteNaming, ParentMap, TreeViewState, VItem};

/// Viewport height, in rows, assumed while the container has no size yet.
pub const FALLBACK_CLIENT_ROWS: usize = 20;
/// Viewport width assumed while the container has no size yet.
pub const FALLBACK_CLIENT_WIDTH: usize = 80;
/// Rows kept above a target scrolled into view.
pub const REVEAL_BUFFER_ROWS: usize = 3;

/// Lifecycle of a view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Attached,
    Rendering,
    Idle,
    Destroyed,
}

/// Keys understood by the tree navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
    Enter,
    Space,
}

/// Scroll container owned by the caller; the view only reads and scrolls it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: usize,
    pub scroll_left: usize,
    pub client_height: usize,
    pub client_width: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeasureError {
    #[error("viewport has no height")]
    NoHeight,
    #[error("viewport has no width")]
    NoWidth,
}

impl Viewport {
    pub fn new(client_width: usize, client_height: usize) -> Self {
        Self {
            client_width,
            client_height,
            ..Self::default()
        }
    }

    fn measure(&self) -> Result<(usize, usize), MeasureError> {
        if self.client_height == 0 {
            return Err(MeasureError::NoHeight);
        }
        if self.client_width == 0 {
            return Err(MeasureError::NoWidth);
        }
        Ok((self.client_height, self.client_width))
    }
}

/// Tunables of a view instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub row_height: usize,
    pub buffer_rows: usize,
    pub naming: NoteNaming,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            row_height: 1,
            buffer_rows: 4,
            naming: NoteNaming::default(),
        }
    }
}

/// Counters for the rebinding path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub renders: usize,
    pub full_builds: usize,
    pub refreshes: usize,
}

/// Scroll/resize notifications waiting for the next frame. Later values
/// overwrite earlier ones.
#[derive(Debug, Clone, Copy, Default)]
struct PendingFrame {
    scroll_top: Option<usize>,
    size: Option<(usize, usize)>,
}

impl PendingFrame {
    fn is_empty(&self) -> bool {
        self.scroll_top.is_none() && self.size.is_none()
    }
}

pub struct VirtualTree {
    phase: Phase,
    options: EngineOptions,
    data: Vec<VItem>,
    rows: Vec<FlatRow>,
    parent_map: ParentMap,
    state: TreeViewState,
    viewport: Viewport,
    window: VisibleWindow,
    pool: Vec<RowSlot>,
    pending: PendingFrame,
    settle_target: Option<String>,
    stats: RenderStats,
    renderer: Box<dyn RowRenderer>,
    handler: Box<dyn RowEventHandler>,
    log: Arc<dyn LogPort>,
}

impl VirtualTree {
    pub fn new(
        options: EngineOptions,
        renderer: Box<dyn RowRenderer>,
        handler: Box<dyn RowEventHandler>,
        log: Arc<dyn LogPort>,
    ) -> Self {
        Self {
            phase: Phase::Uninitialized,
            options,
            data: Vec::new(),
            rows: Vec::new(),
            parent_map: ParentMap::new(),
            state: TreeViewState::default(),
            viewport: Viewport::default(),
            window: VisibleWindow::default(),
            pool: Vec::new(),
            pending: PendingFrame::default(),
            settle_target: None,
            stats: RenderStats::default(),
            renderer,
            handler,
            log,
        }
    }

    /// Attach to a viewport with initial data and render once.
    pub fn mount(&mut self, viewport: Viewport, data: Vec<VItem>) {
        if self.phase != Phase::Uninitialized {
            self.log.log("tree view already mounted");
            return;
        }
        self.viewport = viewport;
        self.phase = Phase::Attached;
        self.load(data);
        let (client_height, _) = self.measure();
        self.grow_pool(required_pool_size(
            self.row_height(),
            self.options.buffer_rows,
            client_height,
        ));
        self.render();
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn data(&self) -> &[VItem] {
        &self.data
    }

    pub fn parent_map(&self) -> &ParentMap {
        &self.parent_map
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn window(&self) -> VisibleWindow {
        self.window
    }

    pub fn pool(&self) -> &[RowSlot] {
        &self.pool
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.state.expansion
    }

    pub fn focus_index(&self) -> Option<usize> {
        self.state.focus_index
    }

    pub fn focused_row(&self) -> Option<&FlatRow> {
        self.state.focus_index.and_then(|i| self.rows.get(i))
    }

    pub fn selection_id(&self) -> Option<&str> {
        self.state.selection_id.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state
            .selection_id
            .as_deref()
            .and_then(|id| self.index_of(id))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.state.expansion.is_expanded(id)
    }

    fn row_height(&self) -> usize {
        self.options.row_height.max(1)
    }

    fn is_live(&self) -> bool {
        !matches!(self.phase, Phase::Uninitialized | Phase::Destroyed)
    }

    // ── Data ────────────────────────────────────────────────────────────────

    /// Replace the data. Scroll returns to the top and focus/selection are cleared.
    pub fn set_data(&mut self, data: Vec<VItem>) {
        self.load(data);
        self.viewport.scroll_top = 0;
        self.viewport.scroll_left = 0;
        self.state.focus_index = None;
        self.state.selection_id = None;
        self.settle_target = None;
        self.mark_all_dirty();
        self.render();
    }

    fn load(&mut self, data: Vec<VItem>) {
        self.parent_map = parent_map_of(&data);
        self.data = data;
        self.rows = flatten(&self.data, &self.state.expansion);
    }

    /// Expanded paths, for persistence.
    pub fn get_expanded_paths(&self) -> Vec<String> {
        self.state.expansion.expanded_paths()
    }

    /// Restore persisted expanded paths.
    pub fn set_expanded_paths<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.expansion.set_expanded_paths(paths);
        self.reproject();
        self.render();
    }

    /// Apply a rename to the loaded data without rebuilding it.
    ///
    /// When the outcome is not applied nothing changed and the caller should
    /// rebuild from the inventory.
    pub fn rename_in_place(&mut self, old_path: &str, new_path: &str) -> PatchOutcome {
        let focused_id = self.focused_row().map(|r| r.id.clone());
        let outcome = patch::rename_in_place(
            &mut self.data,
            &mut self.parent_map,
            &mut self.state.expansion,
            &self.options.naming,
            old_path,
            new_path,
        );
        match &outcome.fallback {
            None => {
                {
                    let map = outcome.selection_mapper();
                    self.state.selection_id = self.state.selection_id.as_deref().map(&map);
                    let focused_id = focused_id.as_deref().map(&map);
                    self.rows = flatten(&self.data, &self.state.expansion);
                    self.state.focus_index = focused_id.and_then(|id| self.index_of(&id));
                }
                self.mark_all_dirty();
                self.render();
            }
            Some(reason) => self
                .log
                .log(&format!("rename {} -> {} needs rebuild: {}", old_path, new_path, reason)),
        }
        outcome
    }

    fn reproject(&mut self) {
        self.rows = flatten(&self.data, &self.state.expansion);
        if let Some(focus) = self.state.focus_index {
            if focus >= self.rows.len() {
                self.state.focus_index = self.rows.len().checked_sub(1);
            }
        }
    }

    fn mark_all_dirty(&mut self) {
        for slot in &mut self.pool {
            slot.dirty = true;
        }
    }

    // ── Expansion ───────────────────────────────────────────────────────────

    pub fn toggle(&mut self, id: &str) -> bool {
        self.change_expansion(id, |e| e.toggle(id))
    }

    pub fn expand(&mut self, id: &str) -> bool {
        self.change_expansion(id, |e| e.expand(id))
    }

    pub fn collapse(&mut self, id: &str) -> bool {
        self.change_expansion(id, |e| e.collapse(id))
    }

    /// Mutate expansion for `id`, then re-locate selection, focus and the
    /// row at the top of the viewport by id.
    fn change_expansion(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut ExpansionState) -> bool,
    ) -> bool {
        if !self.is_live() {
            return false;
        }
        let row_height = self.row_height();
        let selected_id = self.state.selection_id.clone();
        let focused_id = self.focused_row().map(|r| r.id.clone());
        let old_scroll = self.viewport.scroll_top;
        let anchor_index = old_scroll / row_height;
        let anchor_id = self.rows.get(anchor_index).map(|r| r.id.clone());

        if !change(&mut self.state.expansion) {
            return false;
        }
        self.rows = flatten(&self.data, &self.state.expansion);
        let toggled_index = self.index_of(id);

        if let Some(selected) = selected_id {
            if self.index_of(&selected).is_none() && toggled_index.is_some() {
                self.state.selection_id = Some(id.to_string());
            }
        }
        self.state.focus_index = match focused_id {
            Some(focused) => self.index_of(&focused).or(toggled_index),
            None => None,
        };

        if let Some(anchor) = anchor_id {
            if let Some(new_index) = self.index_of(&anchor).or(toggled_index) {
                let delta = new_index as isize - anchor_index as isize;
                let shifted = old_scroll as isize + delta * row_height as isize;
                self.viewport.scroll_top = shifted.max(0) as usize;
            }
        }
        self.render();
        true
    }

    /// Expand every id in `ids` without anchoring; used by reveal.
    pub(crate) fn expand_many(&mut self, ids: &[String]) {
        for id in ids {
            self.state.expansion.expand(id);
        }
        self.reproject();
    }

    pub(crate) fn restore_expansion(&mut self, expansion: ExpansionState) {
        self.state.expansion = expansion;
        self.reproject();
    }

    // ── Rendering ───────────────────────────────────────────────────────────

    fn measure(&self) -> (usize, usize) {
        match self.viewport.measure() {
            Ok(size) => size,
            Err(e) => {
                self.log.log(&format!("{}; using fallback size", e));
                let height = match self.viewport.client_height {
                    0 => FALLBACK_CLIENT_ROWS * self.row_height(),
                    h => h,
                };
                let width = match self.viewport.client_width {
                    0 => FALLBACK_CLIENT_WIDTH,
                    w => w,
                };
                (height, width)
            }
        }
    }

    /// Pools only grow.
    fn grow_pool(&mut self, required: usize) {
        if required > self.pool.len() {
            self.pool.resize_with(required, RowSlot::default);
        }
    }

    /// Bind pool slots to the rows of the current window.
    pub fn render(&mut self) {
        if !self.is_live() {
            return;
        }
        self.phase = Phase::Rendering;
        let row_height = self.row_height();
        let (client_height, _) = self.measure();
        self.grow_pool(required_pool_size(
            row_height,
            self.options.buffer_rows,
            client_height,
        ));

        let max = max_scroll(self.rows.len(), row_height, client_height);
        if self.viewport.scroll_top > max {
            self.viewport.scroll_top = max;
        }
        self.window = compute_window(
            self.viewport.scroll_top,
            row_height,
            self.options.buffer_rows,
            client_height,
            self.rows.len(),
            Some(self.pool.len()),
        );
        self.bind_pool();
        self.stats.renders += 1;
        self.phase = Phase::Idle;
    }

    fn bind_pool(&mut self) {
        let row_height = self.row_height();
        let focus = self.state.focus_index;
        let selected = self.state.selection_id.as_deref();
        let window = self.window;
        for (i, slot) in self.pool.iter_mut().enumerate() {
            let index = window.start + i;
            let row = match self.rows.get(index) {
                Some(row) if window.contains(index) => row,
                _ => {
                    slot.hide();
                    continue;
                }
            };
            slot.index = Some(index);
            slot.offset = index * row_height;
            slot.hidden = false;
            slot.flags = RowFlags {
                focused: focus == Some(index),
                selected: selected == Some(row.id.as_str()),
                expanded: row.expanded,
            };
            if slot.is_bound_to(&row.id) && !slot.dirty {
                self.renderer.refresh(row, slot);
                self.stats.refreshes += 1;
            } else {
                slot.bound_id = Some(row.id.clone());
                self.renderer.build(row, slot);
                slot.dirty = false;
                self.stats.full_builds += 1;
            }
        }
    }

    /// Visible slots in row order.
    pub fn visible_slots(&self) -> impl Iterator<Item = &RowSlot> {
        let mut slots: Vec<&RowSlot> = self.pool.iter().filter(|s| !s.hidden).collect();
        slots.sort_by_key(|s| s.index);
        slots.into_iter()
    }

    // ── Frame coalescing ────────────────────────────────────────────────────

    /// Record a scroll position; applied on the next frame.
    pub fn on_scroll(&mut self, scroll_top: usize) {
        self.pending.scroll_top = Some(scroll_top);
    }

    /// Record a viewport size; applied on the next frame.
    pub fn on_resize(&mut self, client_width: usize, client_height: usize) {
        if (client_width, client_height)
            == (self.viewport.client_width, self.viewport.client_height)
            && self.pending.size.is_none()
        {
            return;
        }
        self.pending.size = Some((client_width, client_height));
    }

    /// Scroll by whole rows relative to the latest known position.
    pub fn scroll_rows(&mut self, delta: isize) {
        let current = self
            .pending
            .scroll_top
            .unwrap_or(self.viewport.scroll_top) as isize;
        let target = current + delta * self.row_height() as isize;
        self.on_scroll(target.max(0) as usize);
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.pending.is_empty() || self.settle_target.is_some()
    }

    /// Apply pending notifications and render. Returns whether anything ran.
    pub fn run_frame(&mut self) -> bool {
        if !self.is_live() || !self.has_pending_frame() {
            return false;
        }
        let pending = std::mem::take(&mut self.pending);
        if let Some((width, height)) = pending.size {
            self.viewport.client_width = width;
            self.viewport.client_height = height;
        }
        if let Some(scroll_top) = pending.scroll_top {
            self.viewport.scroll_top = scroll_top;
        }
        self.render();
        self.settle_horizontal();
        true
    }

    pub(crate) fn request_settle(&mut self, id: &str) {
        self.settle_target = Some(id.to_string());
    }

    /// Scroll horizontally by `delta` columns, bounded by the widest bound row.
    pub fn scroll_horizontal(&mut self, delta: isize) {
        let widest = self
            .pool
            .iter()
            .filter(|s| !s.hidden)
            .map(|s| s.content.width())
            .max()
            .unwrap_or(0);
        let (_, client_width) = self.measure();
        let max = widest.saturating_sub(client_width) as isize;
        let target = (self.viewport.scroll_left as isize + delta).clamp(0, max.max(0));
        self.viewport.scroll_left = target as usize;
    }

    /// Scroll horizontally so the settle target's label fits the viewport.
    fn settle_horizontal(&mut self) {
        let Some(id) = self.settle_target.take() else {
            return;
        };
        let Some(slot) = self.pool.iter().find(|s| !s.hidden && s.is_bound_to(&id)) else {
            return;
        };
        let label_width = slot.content.width();
        let (_, client_width) = self.measure();
        self.viewport.scroll_left = label_width.saturating_sub(client_width);
    }

    // ── Scrolling and focus ─────────────────────────────────────────────────

    /// Scroll so that `index` is visible, leaving a few rows above it.
    /// Does nothing if the row is already fully visible.
    pub fn scroll_to_index(&mut self, index: usize) {
        if self.rows.is_empty() || !self.is_live() {
            return;
        }
        let row_height = self.row_height();
        let index = index.min(self.rows.len() - 1);
        let (client_height, _) = self.measure();
        let top = index * row_height;
        let bottom = top + row_height;
        let scroll_top = self.viewport.scroll_top;
        if top >= scroll_top && bottom <= scroll_top + client_height {
            return;
        }
        let target = index.saturating_sub(REVEAL_BUFFER_ROWS) * row_height;
        self.viewport.scroll_top = target.min(max_scroll(self.rows.len(), row_height, client_height));
        self.render();
    }

    /// Minimal scroll that brings `index` inside the viewport.
    fn ensure_visible(&mut self, index: usize) {
        let row_height = self.row_height();
        let (client_height, _) = self.measure();
        let top = index * row_height;
        let bottom = top + row_height;
        if top < self.viewport.scroll_top {
            self.viewport.scroll_top = top;
        } else if bottom > self.viewport.scroll_top + client_height {
            self.viewport.scroll_top = bottom.saturating_sub(client_height);
        }
    }

    fn set_focus(&mut self, index: usize) {
        self.state.focus_index = Some(index);
        self.ensure_visible(index);
        self.render();
    }

    /// Focus the row at `index`, clamped to the last row.
    pub fn set_focus_index(&mut self, index: usize) {
        if self.rows.is_empty() || !self.is_live() {
            return;
        }
        self.set_focus(index.min(self.rows.len() - 1));
    }

    /// Focus `path` without selecting it, if it is visible in the projection.
    pub fn focus_path(&mut self, path: &str) -> Option<usize> {
        let index = self.index_of(path)?;
        self.set_focus_index(index);
        Some(index)
    }

    pub(crate) fn set_focus_and_selection(&mut self, index: usize) {
        if let Some(row) = self.rows.get(index) {
            self.state.selection_id = Some(row.id.clone());
            self.state.focus_index = Some(index);
        }
    }

    /// Select `path` if it is present in the current projection.
    pub fn select_path(&mut self, path: &str) -> Option<usize> {
        let index = self.index_of(path)?;
        self.set_focus_and_selection(index);
        self.ensure_visible(index);
        self.render();
        Some(index)
    }

    /// Expand the ancestors of `path`, then focus, select and scroll to it.
    pub fn reveal_path(&mut self, path: &str) -> Option<usize> {
        super::reveal::reveal(self, path)
    }

    /// Row index under a vertical position inside the viewport.
    pub fn index_at(&self, y: usize) -> Option<usize> {
        let index = (self.viewport.scroll_top + y) / self.row_height();
        (index < self.rows.len()).then_some(index)
    }

    /// Focus and activate the row at `index`.
    pub fn click(&mut self, index: usize) {
        if index >= self.rows.len() || !self.is_live() {
            return;
        }
        self.state.focus_index = Some(index);
        self.activate(index);
    }

    /// Branches toggle and fire `on_open`; leaves become selected and fire `on_select`.
    fn activate(&mut self, index: usize) {
        let Some(row) = self.rows.get(index).cloned() else {
            return;
        };
        if row.has_children {
            self.toggle(&row.id);
            self.handler.on_open(&row);
        } else {
            self.state.selection_id = Some(row.id.clone());
            self.render();
            self.handler.on_select(&row);
        }
    }

    /// Keyboard navigation. Returns whether the key was handled.
    pub fn handle_key(&mut self, key: NavKey) -> bool {
        if !self.is_live() || self.rows.is_empty() {
            return false;
        }
        let last = self.rows.len() - 1;
        let page = {
            let (client_height, _) = self.measure();
            (client_height / self.row_height()).max(1)
        };
        let current = self.state.focus_index.map(|i| i.min(last));
        let at = current.unwrap_or(0);

        let target = match key {
            NavKey::Up => current.map_or(0, |i| i.saturating_sub(1)),
            NavKey::Down => current.map_or(0, |i| (i + 1).min(last)),
            NavKey::Home => 0,
            NavKey::End => last,
            NavKey::PageUp => at.saturating_sub(page),
            NavKey::PageDown => (at + page).min(last),
            NavKey::Right => {
                let row = self.rows[at].clone();
                if row.has_children && !row.expanded {
                    self.state.focus_index = Some(at);
                    self.expand(&row.id);
                    self.handler.on_open(&row);
                }
                return true;
            }
            NavKey::Left => {
                let row = self.rows[at].clone();
                if row.has_children && row.expanded {
                    self.state.focus_index = Some(at);
                    self.collapse(&row.id);
                    return true;
                }
                match self
                    .parent_map
                    .get(&row.id)
                    .cloned()
                    .flatten()
                    .and_then(|parent| self.index_of(&parent))
                {
                    Some(parent) => parent,
                    None => return true,
                }
            }
            NavKey::Enter | NavKey::Space => {
                self.state.focus_index = Some(at);
                self.activate(at);
                let focus = self.state.focus_index.unwrap_or(at);
                self.ensure_visible(focus);
                self.render();
                return true;
            }
        };
        self.set_focus(target);
        true
    }

    // ── Teardown ────────────────────────────────────────────────────────────

    /// Release pooled rows and pending work. Safe to call more than once and
    /// before mounting. The caller's viewport state is left as is.
    pub fn destroy(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.pool.clear();
        self.pending = PendingFrame::default();
        self.settle_target = None;
        self.window = VisibleWindow::default();
        self.phase = Phase::Destroyed;
        self.log.log("tree view destroyed");
    }
}
