//! Dotted-hierarchy path rules.
//!
//! A note named `a.b.c.md` lives under the implied ancestors `a.b.md` and
//! `a.md`, which in turn live under the folder that holds the file. These
//! helpers work on vault-relative, `/`-separated path strings; the vault root
//! is [`ROOT`].

use super::node::NodeKind;

/// Path of the vault root folder.
pub const ROOT: &str = "/";

/// Default extension for notes and synthesized ancestors.
pub const DEFAULT_NOTE_EXTENSION: &str = "md";

/// Naming rules for one vault, parameterized by the note extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteNaming {
    extension: String,
}

impl Default for NoteNaming {
    fn default() -> Self {
        Self::new(DEFAULT_NOTE_EXTENSION)
    }
}

impl NoteNaming {
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        Self { extension }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether the path carries the note extension.
    pub fn is_note(&self, path: &str) -> bool {
        let (_, base) = split(path);
        match base.rfind('.') {
            Some(i) if i > 0 => base[i + 1..] == self.extension,
            _ => false,
        }
    }

    /// Number of `/`-separated segments in a folder path. The root is depth 0.
    pub fn folder_depth(path: &str) -> usize {
        if path == ROOT {
            return 0;
        }
        path.split('/').filter(|s| !s.is_empty()).count()
    }

    /// Number of dot-separated segments in the basename, extension excluded.
    pub fn stem_depth(path: &str) -> usize {
        let (_, base) = split(path);
        stem(base).split('.').count()
    }

    /// Parent path of a node in the combined folder/dotted hierarchy.
    ///
    /// Folders drop their last `/` segment. Files and virtual nodes without
    /// internal dots belong to their folder; otherwise the last dotted
    /// segment is dropped and the note extension re-applied, so the parent of
    /// `x/a.b.c.md` is `x/a.b.md`.
    pub fn parent_path(&self, path: &str, kind: NodeKind) -> String {
        if path == ROOT || path.is_empty() {
            return ROOT.to_string();
        }
        let (dir, base) = split(path);
        let folder = || match dir {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => ROOT.to_string(),
        };
        if kind == NodeKind::Folder {
            return folder();
        }
        let stem = stem(base);
        match stem.rfind('.') {
            None => folder(),
            Some(i) => {
                let parent_base = format!("{}.{}", &stem[..i], self.extension);
                match dir {
                    Some(d) if !d.is_empty() => format!("{}/{}", d, parent_base),
                    _ => parent_base,
                }
            }
        }
    }

    /// Sibling key of a node before disambiguation: the folder name, or the
    /// last dotted segment of a file/virtual stem.
    pub fn key_of(&self, path: &str, kind: NodeKind) -> String {
        let (_, base) = split(path);
        if kind == NodeKind::Folder {
            return base.to_string();
        }
        let stem = stem(base);
        stem.rsplit('.').next().unwrap_or(stem).to_string()
    }

    /// Stem of the basename, e.g. `a.b` for `notes/a.b.md`.
    pub fn stem_of<'a>(&self, path: &'a str) -> &'a str {
        let (_, base) = split(path);
        stem(base)
    }

    /// Folder part of a path, `ROOT` when there is none.
    pub fn folder_of<'a>(&self, path: &'a str) -> &'a str {
        match split(path).0 {
            Some(d) if !d.is_empty() => d,
            _ => ROOT,
        }
    }

    /// Joins a folder and a basename into a vault path.
    pub fn join(folder: &str, name: &str) -> String {
        if folder == ROOT || folder.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", folder.trim_end_matches('/'), name)
        }
    }
}

/// Display label for a sibling key: strips a trailing ` (n)` disambiguation.
pub fn display_name(key: &str) -> &str {
    if let Some(open) = key.rfind(" (") {
        if let Some(num) = key[open + 2..].strip_suffix(')') {
            if !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) {
                return &key[..open];
            }
        }
    }
    key
}

/// Returns `key`, or `key (2)`, `key (3)`, ... for the first one not taken.
pub fn disambiguate(key: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&key) {
        return key;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", key, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn split(path: &str) -> (Option<&str>, &str) {
    match path.rfind('/') {
        Some(i) => (Some(&path[..i]), &path[i + 1..]),
        None => (None, path),
    }
}

fn stem(basename: &str) -> &str {
    match basename.rfind('.') {
        Some(i) if i > 0 => &basename[..i],
        _ => basename,
    }
}
