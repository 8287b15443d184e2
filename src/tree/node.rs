use std::collections::{BTreeMap, HashMap};

use super::naming::display_name;

/// Kind of a node in the vault tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    File,
    /// Implied dotted ancestor with no file of its own.
    Virtual,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
            NodeKind::Virtual => "virtual",
        }
    }
}

/// A folder reported by the vault inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub path: String,
}

/// A file reported by the vault inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: String,
    /// Path of the containing folder. Files without one are left out of the tree.
    pub parent: Option<String>,
}

/// Handle to the real entry behind a folder or file node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    Folder(FolderRef),
    File(FileRef),
}

/// A node of the nested vault tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub path: String,
    pub kind: NodeKind,
    /// Children by disambiguated key; iteration order is the display order.
    pub children: BTreeMap<String, TreeNode>,
    pub resource: Option<EntryRef>,
}

impl TreeNode {
    pub fn new(path: impl Into<String>, kind: NodeKind, resource: Option<EntryRef>) -> Self {
        Self {
            path: path.into(),
            kind,
            children: BTreeMap::new(),
            resource,
        }
    }

    /// Find a node by path (depth-first).
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.values().find_map(|child| child.find(path))
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Convert the children of this node into view items, in key order.
    pub fn to_items(&self) -> Vec<VItem> {
        self.children
            .iter()
            .map(|(key, child)| child.to_item(key))
            .collect()
    }

    fn to_item(&self, key: &str) -> VItem {
        VItem {
            id: self.path.clone(),
            key: key.to_string(),
            name: display_name(key).to_string(),
            kind: self.kind,
            children: self.to_items(),
        }
    }
}

/// Item of the data handed to the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VItem {
    pub id: String,
    /// Sort key among siblings, possibly carrying a ` (n)` suffix.
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<VItem>,
}

impl VItem {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Node path -> parent path (`None` for top-level nodes).
pub type ParentMap = HashMap<String, Option<String>>;

/// Build the parent map of a view-item forest.
pub fn parent_map_of(items: &[VItem]) -> ParentMap {
    let mut map = ParentMap::new();
    collect_parents(items, None, &mut map);
    map
}

fn collect_parents(items: &[VItem], parent: Option<&str>, map: &mut ParentMap) {
    for item in items {
        map.insert(item.id.clone(), parent.map(str::to_string));
        collect_parents(&item.children, Some(&item.id), map);
    }
}

/// Sort siblings by key, then id.
pub fn sort_items(items: &mut [VItem]) {
    items.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.id.cmp(&b.id)));
}

pub fn find_item<'a>(items: &'a [VItem], id: &str) -> Option<&'a VItem> {
    for item in items {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_item(&item.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_item_mut<'a>(items: &'a mut [VItem], id: &str) -> Option<&'a mut VItem> {
    for item in items.iter_mut() {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_item_mut(&mut item.children, id) {
            return Some(found);
        }
    }
    None
}
