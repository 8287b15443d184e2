use std::collections::HashMap;

/// Which branches are expanded. Absence of a key means collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    map: HashMap<String, bool>,
}

impl ExpansionState {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.map.get(id).copied().unwrap_or(false)
    }

    /// Returns `true` if the state changed.
    pub fn expand(&mut self, id: &str) -> bool {
        !self.map.insert(id.to_string(), true).unwrap_or(false)
    }

    /// Returns `true` if the state changed.
    pub fn collapse(&mut self, id: &str) -> bool {
        self.map.remove(id).unwrap_or(false)
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_expanded(id) {
            self.collapse(id)
        } else {
            self.expand(id)
        }
    }

    /// Expanded paths in sorted order, for persistence.
    pub fn expanded_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .map
            .iter()
            .filter(|(_, expanded)| **expanded)
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Replace the whole state with the given expanded paths.
    pub fn set_expanded_paths<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map = paths.into_iter().map(|p| (p.into(), true)).collect();
    }

    /// Re-key entries: `remap` returns the new key for entries it matches.
    pub fn remap(&mut self, remap: impl Fn(&str) -> Option<String>) {
        let entries = std::mem::take(&mut self.map);
        self.map = entries
            .into_iter()
            .map(|(key, value)| match remap(&key) {
                Some(new_key) => (new_key, value),
                None => (key, value),
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.map.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// View state shared by toggle, patch and reveal.
///
/// Toggle and reveal write `expansion`, `focus_index` and `selection_id`;
/// the patcher writes `expansion` and remaps `selection_id`; `set_data`
/// clears focus and selection.
#[derive(Debug, Clone, Default)]
pub struct TreeViewState {
    pub expansion: ExpansionState,
    pub focus_index: Option<usize>,
    pub selection_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_collapse_report_changes() {
        let mut state = ExpansionState::default();
        assert!(state.expand("a"));
        assert!(!state.expand("a"));
        assert!(state.is_expanded("a"));
        assert!(state.collapse("a"));
        assert!(!state.collapse("a"));
        assert!(!state.is_expanded("a"));
    }

    #[test]
    fn toggle_flips() {
        let mut state = ExpansionState::default();
        state.toggle("a");
        assert!(state.is_expanded("a"));
        state.toggle("a");
        assert!(!state.is_expanded("a"));
        assert!(state.is_empty());
    }

    #[test]
    fn expanded_paths_round_trip() {
        let mut state = ExpansionState::default();
        state.set_expanded_paths(["b", "a"]);
        assert_eq!(state.expanded_paths(), vec!["a", "b"]);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn remap_rekeys_matching_entries() {
        let mut state = ExpansionState::default();
        state.set_expanded_paths(["old", "old/sub", "other"]);
        state.remap(|k| k.strip_prefix("old").map(|rest| format!("new{}", rest)));
        assert_eq!(state.expanded_paths(), vec!["new", "new/sub", "other"]);
    }
}
