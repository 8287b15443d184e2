use std::collections::HashSet;

use super::node::{NodeKind, VItem};
use super::state::ExpansionState;

/// One line of the rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Nesting depth in the visible flattening.
    pub level: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Pre-order projection of `items`, descending only into expanded branches.
pub fn flatten(items: &[VItem], expansion: &ExpansionState) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    push_rows(items, expansion, 0, &mut seen, &mut rows);
    rows
}

fn push_rows<'a>(
    items: &'a [VItem],
    expansion: &ExpansionState,
    level: usize,
    seen: &mut HashSet<&'a str>,
    rows: &mut Vec<FlatRow>,
) {
    for item in items {
        if !seen.insert(item.id.as_str()) {
            continue;
        }
        let has_children = item.has_children();
        let expanded = has_children && expansion.is_expanded(&item.id);
        rows.push(FlatRow {
            id: item.id.clone(),
            name: item.name.clone(),
            kind: item.kind,
            level,
            has_children,
            expanded,
        });
        if expanded {
            push_rows(&item.children, expansion, level + 1, seen, rows);
        }
    }
}
