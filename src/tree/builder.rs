//! Builds the nested vault tree from flat folder and file lists.
//!
//! Every entry is registered at its hierarchy depth (folder segments plus
//! dotted stem segments), missing dotted ancestors are synthesized as virtual
//! nodes, and the depth buckets are then attached in ascending order so a
//! parent always exists before its children.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::naming::{disambiguate, NoteNaming, ROOT};
use super::node::{EntryRef, FileRef, FolderRef, NodeKind, ParentMap, TreeNode};

/// Upper bound on dotted-ancestor walks.
const MAX_SYNTH_STEPS: usize = 256;

/// Result of a tree build.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub root: TreeNode,
    pub parent_map: ParentMap,
    /// Paths that could not be attached (no parent reference or no parent node).
    pub skipped: Vec<String>,
}

#[derive(Default)]
struct Registry {
    kinds: HashMap<String, NodeKind>,
    resources: HashMap<String, EntryRef>,
    depths: BTreeMap<usize, Vec<String>>,
}

impl Registry {
    fn contains(&self, path: &str) -> bool {
        self.kinds.contains_key(path)
    }

    /// First registration wins, so folders take precedence.
    fn register(&mut self, depth: usize, path: &str, kind: NodeKind, resource: Option<EntryRef>) {
        if self.contains(path) {
            return;
        }
        self.kinds.insert(path.to_string(), kind);
        if let Some(resource) = resource {
            self.resources.insert(path.to_string(), resource);
        }
        self.depths.entry(depth).or_default().push(path.to_string());
    }
}

struct ArenaNode {
    path: String,
    kind: NodeKind,
    resource: Option<EntryRef>,
    children: BTreeMap<String, usize>,
}

/// Converts inventory lists into a [`TreeNode`] hierarchy.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    naming: NoteNaming,
}

impl TreeBuilder {
    pub fn new(naming: NoteNaming) -> Self {
        Self { naming }
    }

    pub fn build(&self, folders: &[FolderRef], files: &[FileRef]) -> BuiltTree {
        let mut registry = Registry::default();
        let mut skipped = Vec::new();

        for folder in folders {
            registry.register(
                NoteNaming::folder_depth(&folder.path),
                &folder.path,
                NodeKind::Folder,
                Some(EntryRef::Folder(folder.clone())),
            );
        }

        let mut placed = Vec::with_capacity(files.len());
        for file in files {
            let Some(parent) = file.parent.as_deref() else {
                skipped.push(file.path.clone());
                continue;
            };
            let depth = NoteNaming::folder_depth(parent) + NoteNaming::stem_depth(&file.path);
            registry.register(
                depth,
                &file.path,
                NodeKind::File,
                Some(EntryRef::File(file.clone())),
            );
            placed.push((file.path.as_str(), depth));
        }

        let folder_paths: HashSet<&str> = folders.iter().map(|f| f.path.as_str()).collect();
        for (path, depth) in placed {
            self.synthesize_ancestors(&mut registry, &folder_paths, path, depth);
        }

        self.assemble(registry, skipped)
    }

    /// Register missing dotted ancestors of `path` as virtual nodes.
    fn synthesize_ancestors(
        &self,
        registry: &mut Registry,
        folder_paths: &HashSet<&str>,
        path: &str,
        depth: usize,
    ) {
        let mut current = path.to_string();
        let mut depth = depth;
        for _ in 0..MAX_SYNTH_STEPS {
            if NoteNaming::stem_depth(&current) <= 1 || depth == 0 {
                break;
            }
            let parent = self.naming.parent_path(&current, NodeKind::Virtual);
            if parent == current {
                break;
            }
            depth -= 1;
            if folder_paths.contains(parent.as_str()) || registry.contains(&parent) {
                break;
            }
            registry.register(depth, &parent, NodeKind::Virtual, None);
            current = parent;
        }
    }

    /// Order inside a depth bucket; decides who keeps the bare key on collision.
    fn rank(&self, path: &str, kind: NodeKind) -> u8 {
        match kind {
            NodeKind::Folder => 0,
            NodeKind::File if self.naming.is_note(path) => 1,
            NodeKind::Virtual => 2,
            NodeKind::File => 3,
        }
    }

    fn assemble(&self, mut registry: Registry, mut skipped: Vec<String>) -> BuiltTree {
        let root_resource = registry.resources.remove(ROOT);
        let mut arena = vec![ArenaNode {
            path: ROOT.to_string(),
            kind: NodeKind::Folder,
            resource: root_resource,
            children: BTreeMap::new(),
        }];
        let mut index: HashMap<String, usize> = HashMap::from([(ROOT.to_string(), 0)]);
        let mut parent_map = ParentMap::new();

        let depths = std::mem::take(&mut registry.depths);
        for (_, mut paths) in depths {
            paths.sort_by(|a, b| {
                let ra = self.rank(a, registry.kinds[a]);
                let rb = self.rank(b, registry.kinds[b]);
                ra.cmp(&rb).then_with(|| a.cmp(b))
            });
            for path in paths {
                if path == ROOT {
                    continue;
                }
                let kind = registry.kinds[&path];
                let parent = self.naming.parent_path(&path, kind);
                if parent == path {
                    skipped.push(path);
                    continue;
                }
                let Some(&parent_idx) = index.get(&parent) else {
                    skipped.push(path);
                    continue;
                };
                let key = disambiguate(self.naming.key_of(&path, kind), |k| {
                    arena[parent_idx].children.contains_key(k)
                });
                let idx = arena.len();
                arena.push(ArenaNode {
                    path: path.clone(),
                    kind,
                    resource: registry.resources.remove(&path),
                    children: BTreeMap::new(),
                });
                arena[parent_idx].children.insert(key, idx);
                index.insert(path.clone(), idx);
                let parent = if parent == ROOT { None } else { Some(parent) };
                parent_map.insert(path, parent);
            }
        }

        BuiltTree {
            root: materialize(&mut arena, 0),
            parent_map,
            skipped,
        }
    }
}

fn materialize(arena: &mut [ArenaNode], idx: usize) -> TreeNode {
    let children = std::mem::take(&mut arena[idx].children);
    let path = std::mem::take(&mut arena[idx].path);
    let resource = arena[idx].resource.take();
    let kind = arena[idx].kind;
    TreeNode {
        path,
        kind,
        resource,
        children: children
            .into_iter()
            .map(|(key, child)| (key, materialize(arena, child)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders(paths: &[&str]) -> Vec<FolderRef> {
        paths
            .iter()
            .map(|p| FolderRef {
                path: p.to_string(),
            })
            .collect()
    }

    fn file(path: &str, parent: &str) -> FileRef {
        FileRef {
            path: path.to_string(),
            parent: Some(parent.to_string()),
        }
    }

    fn keys(node: &TreeNode) -> Vec<&str> {
        node.children.keys().map(String::as_str).collect()
    }

    fn sample() -> BuiltTree {
        let folders = folders(&["/", "x", "x/y", "x/y/z"]);
        let files = vec![
            file("x/y/z/a.b.c.d.canvas", "x/y/z"),
            file("x/y/z/a.jpg", "x/y/z"),
            file("x/y/z/a.md", "x/y/z"),
            file("x/y/z/a.b.c.md", "x/y/z"),
            file("a.md", "/"),
            file("a.b.c.md", "/"),
        ];
        TreeBuilder::default().build(&folders, &files)
    }

    fn assert_parent_rule(naming: &NoteNaming, node: &TreeNode) {
        for child in node.children.values() {
            assert_eq!(
                naming.parent_path(&child.path, child.kind),
                node.path,
                "parent of {}",
                child.path
            );
            assert_parent_rule(naming, child);
        }
    }

    #[test]
    fn builds_dotted_hierarchy_under_folders_and_root() {
        let built = sample();
        let root = &built.root;
        assert_eq!(keys(root), vec!["a", "x"]);

        let a = &root.children["a"];
        assert_eq!(a.path, "a.md");
        assert_eq!(a.kind, NodeKind::File);
        let b = &a.children["b"];
        assert_eq!(b.path, "a.b.md");
        assert_eq!(b.kind, NodeKind::Virtual);
        let c = &b.children["c"];
        assert_eq!(c.path, "a.b.c.md");
        assert_eq!(c.kind, NodeKind::File);

        let z = &root.children["x"].children["y"].children["z"];
        assert_eq!(keys(z), vec!["a", "a (2)"]);
        assert_eq!(z.children["a (2)"].path, "x/y/z/a.jpg");
        let zb = &z.children["a"].children["b"];
        assert_eq!(zb.kind, NodeKind::Virtual);
        let zc = &zb.children["c"];
        assert_eq!(zc.path, "x/y/z/a.b.c.md");
        assert_eq!(zc.children["d"].path, "x/y/z/a.b.c.d.canvas");
        assert!(built.skipped.is_empty());
    }

    #[test]
    fn every_node_satisfies_the_parent_rule() {
        let built = sample();
        assert_parent_rule(&NoteNaming::default(), &built.root);
        for (path, parent) in &built.parent_map {
            let node = built.root.find(path).expect("mapped node exists");
            let expected = NoteNaming::default().parent_path(path, node.kind);
            match parent {
                Some(p) => assert_eq!(p, &expected),
                None => assert_eq!(expected, ROOT),
            }
        }
        assert_eq!(built.parent_map.len(), built.root.descendant_count());
    }

    #[test]
    fn real_folders_win_over_virtual_synthesis() {
        let folders = folders(&["notes", "notes/a.md"]);
        let files = vec![file("notes/a.b.md", "notes")];
        let built = TreeBuilder::default().build(&folders, &files);
        let notes = &built.root.children["notes"];
        assert_eq!(notes.children["a.md"].kind, NodeKind::Folder);
        assert!(notes
            .children
            .values()
            .all(|n| n.kind != NodeKind::Virtual));
    }

    #[test]
    fn virtual_nodes_are_shared_between_siblings() {
        let files = vec![
            file("proj.api.auth.md", "/"),
            file("proj.api.users.md", "/"),
        ];
        let built = TreeBuilder::default().build(&[], &files);
        let proj = &built.root.children["proj"];
        assert_eq!(proj.kind, NodeKind::Virtual);
        let api = &proj.children["api"];
        assert_eq!(keys(api), vec!["auth", "users"]);
        assert!(proj.resource.is_none());
        assert!(api.children["auth"].resource.is_some());
    }

    #[test]
    fn files_without_parent_reference_are_excluded() {
        let files = vec![
            FileRef {
                path: "orphan.md".into(),
                parent: None,
            },
            file("kept.md", "/"),
        ];
        let built = TreeBuilder::default().build(&[], &files);
        assert_eq!(keys(&built.root), vec!["kept"]);
        assert_eq!(built.skipped, vec!["orphan.md".to_string()]);
    }

    #[test]
    fn self_referential_parent_is_skipped() {
        let files = vec![file(".md", "/")];
        let built = TreeBuilder::default().build(&[], &files);
        assert!(built.root.children.is_empty());
        assert_eq!(built.skipped, vec![".md".to_string()]);
    }

    #[test]
    fn empty_input_builds_bare_root() {
        let built = TreeBuilder::default().build(&[], &[]);
        assert_eq!(built.root.path, ROOT);
        assert!(built.root.children.is_empty());
        assert!(built.parent_map.is_empty());
    }
}
