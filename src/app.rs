use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::commands::{Action, Keymap};
use crate::config::AppConfig;
use crate::error::Result;
use crate::fs::watcher::EchoFilter;
use crate::logging::LogPort;
use crate::persist::{StateStore, VaultState};
use crate::tree::node::find_item;
use crate::tree::patch::PathRewrite;
use crate::tree::{NodeKind, NoteNaming, TreeBuilder, VItem, ROOT};
use crate::vault::{hierarchy_renames, rename_batch, DiskVault, VaultOps, VaultSource};
use crate::view::{EngineOptions, LineRenderer, RowEventHandler, Viewport, VirtualTree};
use crate::event::Activation;

/// How long the watcher echo of a UI-initiated change is ignored.
const ECHO_WINDOW: Duration = Duration::from_secs(2);
/// Columns moved by one horizontal scroll step.
const HORIZONTAL_STEP: isize = 4;
/// Seconds a status notice stays visible.
const NOTICE_SECS: u64 = 3;

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CreateNote { folder: String },
    CreateFolder { parent: String },
    Rename { original: String, kind: NodeKind },
    DeleteConfirm { target: String, descendants: usize },
    Error { message: String },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// Behavior switches taken from the configuration.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub options: EngineOptions,
    pub use_icons: bool,
    pub auto_reveal: bool,
    pub restore_expanded: bool,
    pub confirm_delete: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl AppSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            options: config.engine_options(),
            use_icons: config.use_icons(),
            auto_reveal: config.auto_reveal(),
            restore_expanded: config.restore_expanded(),
            confirm_delete: config.confirm_delete(),
        }
    }
}

/// Main application state.
pub struct App {
    pub vault: DiskVault,
    pub naming: NoteNaming,
    pub tree: VirtualTree,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    /// Notice text, when it was set, and whether it reports a failure.
    pub status_message: Option<(String, Instant, bool)>,
    pub should_quit: bool,
    pub watcher_active: bool,
    /// Note last chosen in the tree.
    pub active_path: Option<String>,
    /// Inner area of the tree panel from the last draw, for mouse hit tests.
    pub tree_area: Rect,
    /// Number of full rebuilds since start.
    pub rebuilds: usize,
    pub keymap: Keymap,
    echo: EchoFilter,
    store: Option<StateStore>,
    settings: AppSettings,
    log: Arc<dyn LogPort>,
}

impl App {
    /// Build the tree for `vault` and mount it in `viewport`.
    pub fn new(
        vault: DiskVault,
        settings: AppSettings,
        handler: Box<dyn RowEventHandler>,
        log: Arc<dyn LogPort>,
        store: Option<StateStore>,
        viewport: Viewport,
    ) -> Result<Self> {
        let tree = VirtualTree::new(
            settings.options.clone(),
            Box::new(LineRenderer::new(settings.use_icons)),
            handler,
            log.clone(),
        );
        let mut app = Self {
            vault,
            naming: settings.options.naming.clone(),
            tree,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            should_quit: false,
            watcher_active: true,
            active_path: None,
            tree_area: Rect::default(),
            rebuilds: 0,
            keymap: Keymap,
            echo: EchoFilter::new(ECHO_WINDOW),
            store,
            settings,
            log,
        };
        let items = app.load_inventory()?;
        app.tree.mount(viewport, items);
        if app.settings.restore_expanded {
            app.restore_state();
        }
        Ok(app)
    }

    // ── Inventory ───────────────────────────────────────────────────────────

    fn load_inventory(&mut self) -> Result<Vec<VItem>> {
        let (folders, files) = self.vault.inventory()?;
        let built = TreeBuilder::new(self.naming.clone()).build(&folders, &files);
        self.log.log(&format!(
            "built tree of {} nodes from {} files",
            built.root.descendant_count(),
            files.len()
        ));
        if !built.skipped.is_empty() {
            self.log.log(&format!(
                "{} entries left out of the tree: {}",
                built.skipped.len(),
                built.skipped.join(", ")
            ));
        }
        Ok(built.root.to_items())
    }

    /// Rebuild the tree from disk, keeping scroll, selection and focus where
    /// the nodes still exist.
    pub fn refresh(&mut self) {
        let items = match self.load_inventory() {
            Ok(items) => items,
            Err(e) => {
                self.log.error(&format!("rebuild failed: {}", e));
                self.open_dialog(
                    DialogKind::Error {
                        message: format!("Rebuild failed: {}", e),
                    },
                    String::new(),
                );
                return;
            }
        };
        let selected = self.tree.selection_id().map(str::to_string);
        let focused = self.tree.focused_row().map(|r| r.id.clone());
        let scroll_top = self.tree.viewport().scroll_top;

        self.tree.set_data(items);
        self.rebuilds += 1;
        self.tree.on_scroll(scroll_top);
        self.tree.run_frame();

        if let Some(id) = selected {
            if self.settings.auto_reveal {
                self.tree.reveal_path(&id);
            } else {
                self.tree.select_path(&id);
            }
        }
        if let Some(id) = focused {
            self.tree.focus_path(&id);
        }
    }

    // ── Actions ─────────────────────────────────────────────────────────────

    pub fn perform(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit(),
            Action::Nav(key) => {
                self.tree.handle_key(key);
            }
            Action::NewNote => {
                let folder = self.target_folder();
                self.open_dialog(DialogKind::CreateNote { folder }, String::new());
            }
            Action::NewChild => self.open_child_dialog(),
            Action::NewFolder => {
                let parent = self.target_folder();
                self.open_dialog(DialogKind::CreateFolder { parent }, String::new());
            }
            Action::Materialize => self.materialize_focused(),
            Action::Rename => {
                if let Some(row) = self.tree.focused_row().cloned() {
                    let base = basename(&row.id).to_string();
                    self.open_dialog(
                        DialogKind::Rename {
                            original: row.id,
                            kind: row.kind,
                        },
                        base,
                    );
                }
            }
            Action::Delete => self.request_delete(),
            Action::Refresh => {
                self.refresh();
                self.set_status_message("Tree rebuilt".into());
            }
            Action::RevealActive => match self.active_path.clone() {
                Some(path) => {
                    if self.tree.reveal_path(&path).is_none() {
                        self.set_error(format!("{} is not in the tree", path));
                    }
                }
                None => self.set_status_message("No active note".into()),
            },
            Action::ToggleWatcher => {
                self.watcher_active = !self.watcher_active;
                let state = if self.watcher_active { "on" } else { "off" };
                self.set_status_message(format!("Auto-refresh {}", state));
            }
            Action::ScrollLeft => self.tree.scroll_horizontal(-HORIZONTAL_STEP),
            Action::ScrollRight => self.tree.scroll_horizontal(HORIZONTAL_STEP),
        }
    }

    /// Folder new entries go into: the focused folder, or the folder of the
    /// focused note.
    fn target_folder(&self) -> String {
        match self.tree.focused_row() {
            Some(row) if row.kind == NodeKind::Folder => row.id.clone(),
            Some(row) => self.naming.folder_of(&row.id).to_string(),
            None => ROOT.to_string(),
        }
    }

    fn open_child_dialog(&mut self) {
        let (folder, prefix) = match self.tree.focused_row() {
            Some(row) if row.kind == NodeKind::Folder => (row.id.clone(), String::new()),
            Some(row) => (
                self.naming.folder_of(&row.id).to_string(),
                format!("{}.", self.naming.stem_of(&row.id)),
            ),
            None => (ROOT.to_string(), String::new()),
        };
        self.open_dialog(DialogKind::CreateNote { folder }, prefix);
    }

    fn materialize_focused(&mut self) {
        match self.tree.focused_row().cloned() {
            Some(row) if row.kind == NodeKind::Virtual => self.create_note_at(row.id),
            _ => self.set_status_message("Focus a virtual note to create its file".into()),
        }
    }

    fn request_delete(&mut self) {
        let Some(row) = self.tree.focused_row().cloned() else {
            return;
        };
        if row.kind == NodeKind::Virtual {
            self.set_error(format!("{} has no file of its own", row.id));
            return;
        }
        if self.settings.confirm_delete {
            let descendants = find_item(self.tree.data(), &row.id)
                .map(count_descendants)
                .unwrap_or(0);
            self.open_dialog(
                DialogKind::DeleteConfirm {
                    target: row.id,
                    descendants,
                },
                String::new(),
            );
        } else {
            self.delete(&row.id);
        }
    }

    // ── Dialog confirmation ─────────────────────────────────────────────────

    /// Apply the open dialog.
    pub fn confirm_dialog(&mut self) {
        let kind = match std::mem::take(&mut self.mode) {
            AppMode::Dialog(kind) => kind,
            AppMode::Normal => return,
        };
        let input = self.dialog_state.input.trim().to_string();
        self.dialog_state = DialogState::default();

        match kind {
            DialogKind::CreateNote { folder } => {
                if input.is_empty() {
                    return;
                }
                let path = self.note_path(&folder, &input);
                self.create_note_at(path);
            }
            DialogKind::CreateFolder { parent } => {
                if input.is_empty() {
                    return;
                }
                let path = NoteNaming::join(&parent, input.trim_matches('/'));
                match self.vault.create_folder(&path) {
                    Ok(()) => {
                        self.record_echo(&[path.as_str()]);
                        self.refresh();
                        self.tree.reveal_path(&path);
                        self.set_status_message(format!("Created {}", path));
                    }
                    Err(e) => self.set_error(format!("Create failed: {}", e)),
                }
            }
            DialogKind::Rename { original, kind } => {
                if input.is_empty() {
                    return;
                }
                let new_path = self.rename_target(&original, &input);
                self.rename(&original, kind, &new_path);
            }
            DialogKind::DeleteConfirm { target, .. } => self.delete(&target),
            DialogKind::Error { .. } => {}
        }
    }

    /// Vault path for a name typed in the create dialog. The note extension
    /// is appended unless already present; a `/` makes it vault-relative.
    fn note_path(&self, folder: &str, input: &str) -> String {
        let suffix = format!(".{}", self.naming.extension());
        let name = if input.ends_with(&suffix) {
            input.to_string()
        } else {
            format!("{}{}", input, suffix)
        };
        if name.contains('/') {
            name.trim_start_matches('/').to_string()
        } else {
            NoteNaming::join(folder, &name)
        }
    }

    fn rename_target(&self, original: &str, input: &str) -> String {
        if input.contains('/') {
            input.trim_start_matches('/').to_string()
        } else {
            NoteNaming::join(self.naming.folder_of(original), input)
        }
    }

    fn create_note_at(&mut self, path: String) {
        match self.vault.create_file(&path) {
            Ok(()) => {
                self.record_echo(&[path.as_str()]);
                self.refresh();
                self.tree.reveal_path(&path);
                self.active_path = Some(path.clone());
                self.set_status_message(format!("Created {}", path));
            }
            Err(e) => self.set_error(format!("Create failed: {}", e)),
        }
    }

    /// Rename a node. Single entries are patched into the tree in place;
    /// a note family (dotted descendants or a virtual node) is renamed as a
    /// batch followed by a rebuild.
    pub fn rename(&mut self, original: &str, kind: NodeKind, new_path: &str) {
        if original == new_path {
            return;
        }
        let has_children = find_item(self.tree.data(), original).is_some_and(VItem::has_children);
        let family = kind == NodeKind::Virtual || (kind == NodeKind::File && has_children);
        if family {
            self.rename_family(original, new_path);
            return;
        }

        if let Err(e) = self.vault.rename(original, new_path) {
            self.set_error(format!("Rename failed: {}", e));
            return;
        }
        self.record_echo(&[original, new_path]);
        let outcome = self.tree.rename_in_place(original, new_path);
        if !outcome.applied {
            self.refresh();
        }
        self.active_path = self
            .active_path
            .as_deref()
            .map(|p| outcome.rewrite.map(p));
        self.set_status_message(format!("Renamed {} → {}", original, new_path));
    }

    fn rename_family(&mut self, original: &str, new_path: &str) {
        let files = match self.vault.list_files() {
            Ok(files) => files,
            Err(e) => {
                self.set_error(format!("Rename failed: {}", e));
                return;
            }
        };
        let pairs = hierarchy_renames(&self.naming, &files, original, new_path);
        if pairs.is_empty() {
            self.set_error(format!("Nothing to rename under {}", original));
            return;
        }
        let report = rename_batch(&self.vault, &pairs);
        let touched: Vec<&str> = report
            .renamed
            .iter()
            .flat_map(|(from, to)| [from.as_str(), to.as_str()])
            .collect();
        self.record_echo(&touched);

        let rewrite = PathRewrite::new(original, new_path);
        let selected = self.tree.selection_id().map(str::to_string);
        self.refresh();
        let moved = |id: &str| {
            report
                .renamed
                .iter()
                .find(|(from, _)| from == id)
                .map(|(_, to)| to.clone())
                .or_else(|| rewrite.apply(id))
        };
        if let Some(to) = selected.as_deref().and_then(moved) {
            self.tree.reveal_path(&to);
        }
        if let Some(to) = self.active_path.as_deref().and_then(moved) {
            self.active_path = Some(to);
        }

        if report.is_clean() {
            self.set_status_message(format!("Renamed {} notes", report.renamed.len()));
        } else if let Some(notice) = report.notice() {
            self.log.error(&notice);
            self.set_error(notice);
        }
    }

    /// Delete a file or folder, then focus its parent row.
    pub fn delete(&mut self, target: &str) {
        let parent = self.tree.parent_map().get(target).cloned().flatten();
        let index = self.tree.index_of(target);
        if let Err(e) = self.vault.delete(target) {
            self.set_error(format!("Delete failed: {}", e));
            return;
        }
        self.record_echo(&[target]);
        self.refresh();
        let focused = parent.as_deref().and_then(|p| self.tree.focus_path(p));
        if focused.is_none() {
            if let Some(index) = index {
                self.tree.set_focus_index(index.saturating_sub(1));
            }
        }
        if self
            .active_path
            .as_deref()
            .is_some_and(|p| PathRewrite::new(target, "").apply(p).is_some())
        {
            self.active_path = None;
        }
        self.set_status_message(format!("Deleted {}", target));
    }

    // ── External events ─────────────────────────────────────────────────────

    fn record_echo(&mut self, paths: &[&str]) {
        let mut absolute: Vec<PathBuf> = Vec::new();
        for path in paths {
            if let Ok(full) = self.vault.resolve(path) {
                if let Some(parent) = full.parent() {
                    absolute.push(parent.to_path_buf());
                }
                absolute.push(full);
            }
        }
        self.echo.record(absolute, Instant::now());
    }

    /// Debounced watcher batch. Anything the UI did not cause triggers a rebuild.
    pub fn handle_fs_change(&mut self, paths: Vec<PathBuf>) {
        let unexpected = self.echo.unexpected(paths, Instant::now());
        if unexpected.is_empty() {
            return;
        }
        let changed: Vec<String> = unexpected
            .iter()
            .filter_map(|p| self.vault.vault_path(p))
            .collect();
        self.log.log(&format!(
            "{} paths changed on disk; rebuilding: {}",
            unexpected.len(),
            changed.join(", ")
        ));
        self.refresh();
    }

    pub fn handle_activation(&mut self, activation: Activation) {
        match activation {
            Activation::Select(row) => {
                self.log.log(&format!("selected {}", row.id));
                self.active_path = Some(row.id);
            }
            Activation::Open(row) => {
                self.log.log(&format!("toggled {}", row.id));
            }
        }
    }

    /// Per-tick housekeeping: pending scroll/resize frame and notice expiry.
    pub fn tick(&mut self) {
        self.tree.run_frame();
        self.clear_expired_status();
    }

    /// Track the size of the tree panel.
    pub fn sync_viewport(&mut self, area: Rect) {
        self.tree_area = area;
        self.tree.on_resize(area.width as usize, area.height as usize);
        self.tree.run_frame();
    }

    // ── Persistence ─────────────────────────────────────────────────────────

    fn restore_state(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load(self.vault.root()) {
            Ok(state) => {
                self.tree.set_expanded_paths(state.expanded);
                if let Some(path) = state.last_selected {
                    if self.tree.reveal_path(&path).is_some() {
                        self.active_path = Some(path);
                    }
                }
            }
            Err(e) => self.log.error(&format!("could not restore view state: {}", e)),
        }
    }

    pub fn save_state(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let state = VaultState {
            expanded: self.tree.get_expanded_paths(),
            last_selected: self.tree.selection_id().map(str::to_string),
        };
        if let Err(e) = store.save(self.vault.root(), state) {
            self.log.error(&format!(
                "could not save view state to {}: {}",
                store.path().display(),
                e
            ));
        }
    }

    /// Persist view state and release the tree view.
    pub fn shutdown(&mut self) {
        self.save_state();
        self.tree.destroy();
    }

    // ── Dialog input ────────────────────────────────────────────────────────

    /// Open a dialog with `input` pre-filled and the cursor at its end.
    pub fn open_dialog(&mut self, kind: DialogKind, input: String) {
        self.dialog_state = DialogState {
            cursor_position: input.len(),
            input,
        };
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Notices ─────────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now(), false));
    }

    pub fn set_error(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now(), true));
    }

    /// Clear the status message once it has been displayed long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, created, _)) = &self.status_message {
            if created.elapsed().as_secs() >= NOTICE_SECS {
                self.status_message = None;
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn count_descendants(item: &VItem) -> usize {
    item.children
        .iter()
        .map(|c| 1 + count_descendants(c))
        .sum()
}
