//! Reveal: expand the ancestors of a path, then focus, select and scroll to it.

use std::collections::HashSet;

use super::engine::VirtualTree;
use crate::tree::ParentMap;

/// Upper bound on ancestor steps; deeper chains are treated as corrupt.
const MAX_ANCESTOR_STEPS: usize = 1024;

/// Ancestors of `path`, nearest first. Stops at a top-level node, an unknown
/// id, or the first id seen twice.
pub fn ancestor_chain(parent_map: &ParentMap, path: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(path);
    let mut current = path;
    for _ in 0..MAX_ANCESTOR_STEPS {
        let Some(Some(parent)) = parent_map.get(current) else {
            break;
        };
        if !visited.insert(parent.as_str()) {
            break;
        }
        chain.push(parent.clone());
        current = parent.as_str();
    }
    chain
}

/// Expand every ancestor of `path` and make it the focused, selected row.
///
/// Returns the row index, or `None` with expansion left as it was when the
/// path does not show up in the projection.
pub fn reveal(tree: &mut VirtualTree, path: &str) -> Option<usize> {
    let chain = ancestor_chain(tree.parent_map(), path);
    let snapshot = tree.expansion().clone();
    tree.expand_many(&chain);

    let Some(index) = tree.index_of(path) else {
        tree.restore_expansion(snapshot);
        return None;
    };
    tree.set_focus_and_selection(index);
    tree.render();
    tree.scroll_to_index(index);
    tree.request_settle(path);
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{FileRef, FolderRef, NoteNaming, TreeBuilder};
    use crate::view::engine::tests::{mounted, wide};
    use pretty_assertions::assert_eq;

    fn notes_vault() -> Vec<crate::tree::VItem> {
        let naming = NoteNaming::default();
        let folders: Vec<FolderRef> = ["Notes", "Notes/tech", "Notes/tech/docs", "Notes/misc"]
            .iter()
            .map(|p| FolderRef {
                path: p.to_string(),
            })
            .collect();
        let files: Vec<FileRef> = [
            "Notes/tech/docs/git.commit.conventional.md",
            "Notes/tech/docs/git.branch.md",
            "Notes/tech/docs/rust.md",
            "Notes/misc/todo.md",
        ]
        .iter()
        .map(|p| FileRef {
            path: p.to_string(),
            parent: Some(naming.folder_of(p).to_string()),
        })
        .collect();
        TreeBuilder::new(naming).build(&folders, &files).root.to_items()
    }

    #[test]
    fn reveal_expands_exactly_the_ancestor_chain() {
        let (mut tree, _) = mounted(notes_vault(), 10);
        let target = "Notes/tech/docs/git.commit.conventional.md";
        let index = tree.reveal_path(target).unwrap();

        assert_eq!(
            tree.get_expanded_paths(),
            vec![
                "Notes",
                "Notes/tech",
                "Notes/tech/docs",
                "Notes/tech/docs/git.commit.md",
                "Notes/tech/docs/git.md",
            ]
        );
        assert!(!tree.is_expanded("Notes/misc"));
        assert_eq!(tree.rows()[index].id, target);
        assert_eq!(tree.selection_id(), Some(target));
        assert_eq!(tree.focus_index(), Some(index));
    }

    #[test]
    fn reveal_unknown_path_leaves_state_unchanged() {
        let (mut tree, _) = mounted(notes_vault(), 10);
        tree.expand("Notes");
        let before = tree.get_expanded_paths();
        let scroll = tree.viewport().scroll_top;

        assert_eq!(tree.reveal_path("Notes/ghost.md"), None);
        assert_eq!(tree.get_expanded_paths(), before);
        assert_eq!(tree.selection_id(), None);
        assert_eq!(tree.viewport().scroll_top, scroll);
    }

    #[test]
    fn reveal_scrolls_far_rows_into_view() {
        let (mut tree, _) = mounted(wide(60, 3), 10);
        let index = tree.reveal_path("f50/n01").unwrap();
        assert_eq!(index, 52);
        let top = tree.viewport().scroll_top;
        assert!(top <= index && index < top + 10);
        assert_eq!(top, index - crate::view::engine::REVEAL_BUFFER_ROWS);
        assert!(tree.has_pending_frame());
        tree.run_frame();
        assert!(!tree.has_pending_frame());
    }

    #[test]
    fn ancestor_chain_stops_on_cycles() {
        let mut map = ParentMap::new();
        map.insert("a".into(), Some("b".into()));
        map.insert("b".into(), Some("c".into()));
        map.insert("c".into(), Some("a".into()));
        assert_eq!(ancestor_chain(&map, "a"), vec!["b", "c"]);
    }

    #[test]
    fn ancestor_chain_of_top_level_and_unknown_ids_is_empty() {
        let mut map = ParentMap::new();
        map.insert("top".into(), None);
        assert!(ancestor_chain(&map, "top").is_empty());
        assert!(ancestor_chain(&map, "missing").is_empty());
    }
}
