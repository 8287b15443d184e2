//! Vault tree model: hierarchy building, flattening, and in-place patching.

pub mod builder;
pub mod flatten;
pub mod naming;
pub mod node;
pub mod patch;
pub mod state;

pub use builder::{BuiltTree, TreeBuilder};
pub use flatten::{flatten, FlatRow};
pub use naming::{NoteNaming, ROOT};
pub use node::{FileRef, FolderRef, NodeKind, ParentMap, TreeNode, VItem};
pub use state::{ExpansionState, TreeViewState};
