//! Applies a single rename/move to the view data without a full rebuild.
//!
//! Anything the patcher does not handle reports `applied == false` together
//! with a [`Fallback`] reason; the caller then rebuilds from the inventory.

use thiserror::Error;

use super::naming::{disambiguate, display_name, NoteNaming, ROOT};
use super::node::{find_item, find_item_mut, parent_map_of, sort_items, NodeKind, ParentMap, VItem};
use super::state::ExpansionState;

const MAX_PRUNE_STEPS: usize = 256;

/// Why a rename could not be applied in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fallback {
    #[error("{0} is not in the tree")]
    NotFound(String),
    #[error("{0} already exists")]
    Occupied(String),
    #[error("parent {0} cannot be resolved")]
    UnresolvedParent(String),
    #[error("cannot move {0} into itself")]
    IntoOwnSubtree(String),
    #[error("{0} is a virtual node")]
    VirtualNode(String),
    #[error("{0} has dotted descendants")]
    DottedDescendants(String),
}

/// Prefix rewrite `old` -> `new`, applied to an id and its `/` descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    old: String,
    new: String,
}

impl PathRewrite {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// The rewritten id, or `None` if `id` is outside the renamed subtree.
    pub fn apply(&self, id: &str) -> Option<String> {
        if self.old.is_empty() {
            return None;
        }
        if id == self.old {
            return Some(self.new.clone());
        }
        id.strip_prefix(self.old.as_str())
            .filter(|rest| rest.starts_with('/'))
            .map(|rest| format!("{}{}", self.new, rest))
    }

    /// Like [`apply`](Self::apply), passing unrelated ids through.
    pub fn map(&self, id: &str) -> String {
        self.apply(id).unwrap_or_else(|| id.to_string())
    }
}

/// Result of [`rename_in_place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub applied: bool,
    pub fallback: Option<Fallback>,
    pub rewrite: PathRewrite,
}

impl PatchOutcome {
    fn applied(rewrite: PathRewrite) -> Self {
        Self {
            applied: true,
            fallback: None,
            rewrite,
        }
    }

    /// Maps a previously selected id to its id after the patch.
    pub fn selection_mapper(&self) -> impl Fn(&str) -> String + '_ {
        move |id| self.rewrite.map(id)
    }
}

/// Rename `old_path` to `new_path` inside `items`.
///
/// On success the expansion keys under the renamed subtree are re-keyed and
/// `parent_map` is rebuilt from the mutated data. On failure nothing is
/// modified.
pub fn rename_in_place(
    items: &mut Vec<VItem>,
    parent_map: &mut ParentMap,
    expansion: &mut ExpansionState,
    naming: &NoteNaming,
    old_path: &str,
    new_path: &str,
) -> PatchOutcome {
    let rewrite = PathRewrite::new(old_path, new_path);
    if old_path.is_empty() || new_path.is_empty() || old_path == new_path {
        return PatchOutcome::applied(rewrite);
    }

    match move_node(items, naming, &rewrite, old_path, new_path) {
        Ok(()) => {
            expansion.remap(|key| rewrite.apply(key));
            *parent_map = parent_map_of(items);
            PatchOutcome::applied(rewrite)
        }
        Err(fallback) => PatchOutcome {
            applied: false,
            fallback: Some(fallback),
            rewrite,
        },
    }
}

fn move_node(
    items: &mut Vec<VItem>,
    naming: &NoteNaming,
    rewrite: &PathRewrite,
    old_path: &str,
    new_path: &str,
) -> Result<(), Fallback> {
    let node = find_item(items, old_path).ok_or_else(|| Fallback::NotFound(old_path.into()))?;
    let kind = node.kind;
    match kind {
        NodeKind::Virtual => return Err(Fallback::VirtualNode(old_path.into())),
        NodeKind::File if node.has_children() => {
            return Err(Fallback::DottedDescendants(old_path.into()))
        }
        _ => {}
    }
    if find_item(items, new_path).is_some() {
        return Err(Fallback::Occupied(new_path.into()));
    }

    let old_parent = naming.parent_path(old_path, kind);
    let new_parent = naming.parent_path(new_path, kind);
    if rewrite.apply(&new_parent).is_some() {
        return Err(Fallback::IntoOwnSubtree(old_path.into()));
    }
    if new_parent != ROOT && find_item(items, &new_parent).is_none() {
        return Err(Fallback::UnresolvedParent(new_parent));
    }

    let key = naming.key_of(new_path, kind);

    if old_parent == new_parent {
        let siblings = children_mut(items, &old_parent)
            .ok_or_else(|| Fallback::UnresolvedParent(old_parent.clone()))?;
        let pos = siblings
            .iter()
            .position(|i| i.id == old_path)
            .ok_or_else(|| Fallback::NotFound(old_path.into()))?;
        let key = disambiguate(key, |k| {
            siblings
                .iter()
                .enumerate()
                .any(|(i, s)| i != pos && s.key == k)
        });
        relabel(&mut siblings[pos], key, rewrite);
        sort_items(siblings);
        return Ok(());
    }

    let siblings = children_mut(items, &old_parent)
        .ok_or_else(|| Fallback::UnresolvedParent(old_parent.clone()))?;
    let pos = siblings
        .iter()
        .position(|i| i.id == old_path)
        .ok_or_else(|| Fallback::NotFound(old_path.into()))?;
    let mut moved = siblings.remove(pos);

    // Existence of the new parent was checked above.
    let target = children_mut(items, &new_parent)
        .ok_or_else(|| Fallback::UnresolvedParent(new_parent.clone()))?;
    let key = disambiguate(key, |k| target.iter().any(|s| s.key == k));
    relabel(&mut moved, key, rewrite);
    target.push(moved);
    sort_items(target);

    prune_empty_virtuals(items, naming, &old_parent);
    Ok(())
}

fn relabel(item: &mut VItem, key: String, rewrite: &PathRewrite) {
    item.name = display_name(&key).to_string();
    item.key = key;
    rewrite_ids(item, rewrite);
}

fn rewrite_ids(item: &mut VItem, rewrite: &PathRewrite) {
    if let Some(id) = rewrite.apply(&item.id) {
        item.id = id;
    }
    for child in &mut item.children {
        rewrite_ids(child, rewrite);
    }
}

/// Children list of `parent`; the top-level list for the root.
fn children_mut<'a>(items: &'a mut Vec<VItem>, parent: &str) -> Option<&'a mut Vec<VItem>> {
    if parent == ROOT {
        return Some(items);
    }
    find_item_mut(items, parent).map(|p| &mut p.children)
}

/// Remove virtual ancestors left without children, walking upward from `start`.
fn prune_empty_virtuals(items: &mut Vec<VItem>, naming: &NoteNaming, start: &str) {
    let mut current = start.to_string();
    for _ in 0..MAX_PRUNE_STEPS {
        if current == ROOT {
            return;
        }
        match find_item(items, &current) {
            Some(node) if node.kind == NodeKind::Virtual && !node.has_children() => {}
            _ => return,
        }
        let parent = naming.parent_path(&current, NodeKind::Virtual);
        if parent == current {
            return;
        }
        if let Some(siblings) = children_mut(items, &parent) {
            siblings.retain(|i| i.id != current);
        }
        current = parent;
    }
}
