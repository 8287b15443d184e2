//! Vault collaborators: the inventory the tree is built from and the
//! filesystem mutations requested by the shell.
//!
//! Paths exchanged with the core are vault-relative and `/`-separated. The
//! vault root itself is [`ROOT`].

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};
use crate::tree::naming::{NoteNaming, ROOT};
use crate::tree::{FileRef, FolderRef};

/// Maximum number of failed items spelled out in a notice.
pub const NOTICE_ITEM_CAP: usize = 3;

/// Inventory of folders and files.
pub trait VaultSource {
    fn list_folders(&self) -> Result<Vec<FolderRef>>;
    fn list_files(&self) -> Result<Vec<FileRef>>;

    /// Folders and files together.
    fn inventory(&self) -> Result<(Vec<FolderRef>, Vec<FileRef>)> {
        Ok((self.list_folders()?, self.list_files()?))
    }
}

/// Filesystem mutations. Implementations refuse to overwrite.
pub trait VaultOps {
    fn create_file(&self, path: &str) -> Result<()>;
    fn create_folder(&self, path: &str) -> Result<()>;
    fn rename(&self, from: &str, to: &str) -> Result<()>;
    fn delete(&self, path: &str) -> Result<()>;
}

/// A vault rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskVault {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

impl DiskVault {
    pub fn new(root: impl Into<PathBuf>, ignore_patterns: Vec<String>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AppError::InvalidPath(root.display().to_string()));
        }
        Ok(Self {
            root,
            ignore_patterns,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a vault path. Rejects anything escaping the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path == ROOT || path.is_empty() {
            return Ok(self.root.clone());
        }
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(AppError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Vault path for an absolute path under the root.
    pub fn vault_path(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            Some(ROOT.to_string())
        } else {
            Some(parts.join("/"))
        }
    }

    fn is_skipped(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore_patterns.iter().any(|p| p == name)
    }

    /// Walk the vault, collecting folders (root first) and files.
    fn walk(&self) -> Result<(Vec<FolderRef>, Vec<FileRef>)> {
        let mut folders = vec![FolderRef {
            path: ROOT.to_string(),
        }];
        let mut files = Vec::new();
        let mut stack = vec![(self.root.clone(), ROOT.to_string())];

        while let Some((dir, vault_dir)) = stack.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().to_string();
                if self.is_skipped(&name) {
                    continue;
                }
                let path = NoteNaming::join(&vault_dir, &name);
                if entry.file_type()?.is_dir() {
                    folders.push(FolderRef { path: path.clone() });
                    stack.push((entry.path(), path));
                } else {
                    files.push(FileRef {
                        path,
                        parent: Some(vault_dir.clone()),
                    });
                }
            }
        }

        folders.sort_by(|a, b| a.path.cmp(&b.path));
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok((folders, files))
    }
}

impl VaultSource for DiskVault {
    fn list_folders(&self) -> Result<Vec<FolderRef>> {
        Ok(self.walk()?.0)
    }

    fn list_files(&self) -> Result<Vec<FileRef>> {
        Ok(self.walk()?.1)
    }

    fn inventory(&self) -> Result<(Vec<FolderRef>, Vec<FileRef>)> {
        self.walk()
    }
}

impl VaultOps for DiskVault {
    fn create_file(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if target.exists() {
            return Err(AppError::Rejected(format!("{} already exists", path)));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)?;
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if target.exists() {
            return Err(AppError::Rejected(format!("{} already exists", path)));
        }
        fs::create_dir_all(&target)?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if source == self.root || target == self.root {
            return Err(AppError::Rejected("cannot rename the vault root".into()));
        }
        if target.exists() {
            return Err(AppError::Rejected(format!("{} already exists", to)));
        }
        if target.starts_with(&source) {
            return Err(AppError::Rejected(format!("cannot move {} into itself", from)));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &target)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if target == self.root {
            return Err(AppError::Rejected("cannot delete the vault root".into()));
        }
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else {
            fs::remove_file(&target)?;
        }
        Ok(())
    }
}

/// Per-item outcome of a batch rename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub renamed: Vec<(String, String)>,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Transient notice text, or `None` when everything succeeded.
    pub fn notice(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let total = self.renamed.len() + self.failed.len();
        let listed: Vec<String> = self
            .failed
            .iter()
            .take(NOTICE_ITEM_CAP)
            .map(|(path, reason)| format!("{}: {}", path, reason))
            .collect();
        let mut text = format!(
            "Renamed {}/{}; failed {}",
            self.renamed.len(),
            total,
            listed.join(", ")
        );
        if self.failed.len() > NOTICE_ITEM_CAP {
            text.push_str(&format!(" and {} more", self.failed.len() - NOTICE_ITEM_CAP));
        }
        Some(text)
    }
}

/// Run each rename independently; failures do not stop the batch.
pub fn rename_batch(ops: &dyn VaultOps, pairs: &[(String, String)]) -> BatchReport {
    let mut report = BatchReport::default();
    for (from, to) in pairs {
        match ops.rename(from, to) {
            Ok(()) => report.renamed.push((from.clone(), to.clone())),
            Err(e) => report.failed.push((from.clone(), e.to_string())),
        }
    }
    report
}

/// Renames needed to move a note together with its dotted descendants.
///
/// Renaming `notes/a.md` to `notes/z.md` maps `notes/a.b.md` to
/// `notes/z.b.md`. Only siblings in the same folder take part; unrelated
/// stems such as `notes/ab.md` and same-stem attachments such as
/// `notes/a.jpg` are left alone.
pub fn hierarchy_renames(
    naming: &NoteNaming,
    files: &[FileRef],
    old_path: &str,
    new_path: &str,
) -> Vec<(String, String)> {
    let old_folder = naming.folder_of(old_path);
    let new_folder = naming.folder_of(new_path);
    let old_stem = naming.stem_of(old_path);
    let new_stem = naming.stem_of(new_path);
    let prefix = format!("{}.", old_stem);

    let mut pairs = Vec::new();
    for file in files {
        if naming.folder_of(&file.path) != old_folder {
            continue;
        }
        let stem = naming.stem_of(&file.path);
        let rest = if stem == old_stem {
            if file.path != old_path {
                continue;
            }
            ""
        } else if let Some(rest) = stem.strip_prefix(&prefix) {
            rest
        } else {
            continue;
        };
        let base = &file.path[file.path.len() - basename_len(&file.path)..];
        let suffix = &base[stem.len()..];
        let new_base = if rest.is_empty() {
            format!("{}{}", new_stem, suffix)
        } else {
            format!("{}.{}{}", new_stem, rest, suffix)
        };
        pairs.push((file.path.clone(), NoteNaming::join(new_folder, &new_base)));
    }
    pairs
}

fn basename_len(path: &str) -> usize {
    path.rsplit('/').next().map_or(0, str::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn vault() -> (TempDir, DiskVault) {
        let tmp = TempDir::new().unwrap();
        let vault = DiskVault::new(tmp.path(), vec!["node_modules".into()]).unwrap();
        (tmp, vault)
    }

    fn file_ref(path: &str) -> FileRef {
        FileRef {
            path: path.into(),
            parent: Some(NoteNaming::default().folder_of(path).to_string()),
        }
    }

    #[test]
    fn new_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            DiskVault::new(&missing, Vec::new()),
            Err(AppError::InvalidPath(_))
        ));
    }

    #[test]
    fn inventory_lists_relative_paths_and_skips_hidden() {
        let (tmp, vault) = vault();
        fs::create_dir_all(tmp.path().join("notes/deep")).unwrap();
        fs::create_dir_all(tmp.path().join(".obsidian")).unwrap();
        fs::create_dir_all(tmp.path().join("node_modules/pkg")).unwrap();
        fs::write(tmp.path().join("root.md"), "").unwrap();
        fs::write(tmp.path().join("notes/a.b.md"), "").unwrap();
        fs::write(tmp.path().join("notes/deep/c.md"), "").unwrap();
        fs::write(tmp.path().join(".obsidian/app.json"), "").unwrap();

        let folders: Vec<String> = vault
            .list_folders()
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(folders, vec!["/", "notes", "notes/deep"]);

        let files = vault.list_files().unwrap();
        assert_eq!(
            files,
            vec![
                file_ref("notes/a.b.md"),
                file_ref("notes/deep/c.md"),
                FileRef {
                    path: "root.md".into(),
                    parent: Some("/".into())
                },
            ]
        );
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let (tmp, vault) = vault();
        vault.create_file("notes/new.md").unwrap();
        assert!(tmp.path().join("notes/new.md").exists());
        let err = vault.create_file("notes/new.md").unwrap_err();
        assert_eq!(err.to_string(), "notes/new.md already exists");

        vault.create_folder("inbox").unwrap();
        assert!(tmp.path().join("inbox").is_dir());
    }

    #[test]
    fn rename_moves_and_creates_target_folder() {
        let (tmp, vault) = vault();
        fs::write(tmp.path().join("a.md"), "x").unwrap();
        vault.rename("a.md", "archive/a.md").unwrap();
        assert!(!tmp.path().join("a.md").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("archive/a.md")).unwrap(),
            "x"
        );
    }

    #[test]
    fn rename_rejects_collisions_and_self_moves() {
        let (tmp, vault) = vault();
        fs::create_dir(tmp.path().join("d")).unwrap();
        fs::write(tmp.path().join("a.md"), "").unwrap();
        fs::write(tmp.path().join("b.md"), "").unwrap();
        assert!(matches!(
            vault.rename("a.md", "b.md"),
            Err(AppError::Rejected(_))
        ));
        assert!(matches!(
            vault.rename("d", "d/inner"),
            Err(AppError::Rejected(_))
        ));
        assert!(matches!(vault.rename("/", "x"), Err(AppError::Rejected(_))));
        assert!(vault.rename("missing.md", "c.md").is_err());
    }

    #[test]
    fn paths_cannot_escape_the_root() {
        let (_tmp, vault) = vault();
        assert!(matches!(
            vault.resolve("../etc/passwd"),
            Err(AppError::InvalidPath(_))
        ));
        assert!(matches!(
            vault.create_file("/abs.md"),
            Err(AppError::InvalidPath(_))
        ));
    }

    #[test]
    fn delete_files_and_folders() {
        let (tmp, vault) = vault();
        fs::create_dir_all(tmp.path().join("d/e")).unwrap();
        fs::write(tmp.path().join("d/e/f.md"), "").unwrap();
        fs::write(tmp.path().join("g.md"), "").unwrap();
        vault.delete("g.md").unwrap();
        vault.delete("d").unwrap();
        assert!(!tmp.path().join("g.md").exists());
        assert!(!tmp.path().join("d").exists());
        assert!(vault.delete("/").is_err());
        assert!(vault.delete("g.md").is_err());
    }

    #[test]
    fn vault_path_round_trips() {
        let (tmp, vault) = vault();
        assert_eq!(
            vault.vault_path(&tmp.path().join("a/b.md")).as_deref(),
            Some("a/b.md")
        );
        assert_eq!(vault.vault_path(tmp.path()).as_deref(), Some("/"));
        assert_eq!(vault.vault_path(Path::new("/elsewhere")), None);
    }

    #[test]
    fn batch_records_each_failure() {
        let (tmp, vault) = vault();
        for name in ["a.md", "b.md", "c.md", "taken.md"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let pairs: Vec<(String, String)> = [
            ("a.md", "x.md"),
            ("b.md", "taken.md"),
            ("c.md", "y.md"),
            ("gone.md", "z.md"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        let report = rename_batch(&vault, &pairs);
        assert_eq!(report.renamed.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert!(!report.is_clean());
        assert!(tmp.path().join("x.md").exists());
        assert!(tmp.path().join("y.md").exists());
        let notice = report.notice().unwrap();
        assert!(notice.starts_with("Renamed 2/4; failed b.md: taken.md already exists"));
    }

    #[test]
    fn notice_caps_listed_failures() {
        let report = BatchReport {
            renamed: Vec::new(),
            failed: (0..5)
                .map(|i| (format!("{}.md", i), "denied".to_string()))
                .collect(),
        };
        let notice = report.notice().unwrap();
        assert!(notice.contains("2.md: denied"));
        assert!(!notice.contains("3.md"));
        assert!(notice.ends_with(" and 2 more"));
        assert_eq!(BatchReport::default().notice(), None);
    }

    #[test]
    fn hierarchy_renames_cover_dotted_family_only() {
        let naming = NoteNaming::default();
        let files: Vec<FileRef> = [
            "notes/a.md",
            "notes/a.b.md",
            "notes/a.b.c.canvas",
            "notes/ab.md",
            "other/a.b.md",
        ]
        .iter()
        .map(|p| file_ref(p))
        .collect();

        let pairs = hierarchy_renames(&naming, &files, "notes/a.md", "notes/z.md");
        assert_eq!(
            pairs,
            vec![
                ("notes/a.md".to_string(), "notes/z.md".to_string()),
                ("notes/a.b.md".to_string(), "notes/z.b.md".to_string()),
                (
                    "notes/a.b.c.canvas".to_string(),
                    "notes/z.b.c.canvas".to_string()
                ),
            ]
        );
    }

    #[test]
    fn hierarchy_renames_leave_same_stem_attachments() {
        let (tmp, vault) = vault();
        for name in ["a.md", "a.b.md", "a.jpg"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let files = vault.list_files().unwrap();
        let pairs = hierarchy_renames(&NoteNaming::default(), &files, "a.md", "z.md");
        assert_eq!(
            pairs,
            vec![
                ("a.b.md".to_string(), "z.b.md".to_string()),
                ("a.md".to_string(), "z.md".to_string()),
            ]
        );

        let report = rename_batch(&vault, &pairs);
        assert!(report.is_clean());
        assert!(tmp.path().join("a.jpg").exists());
        assert!(!tmp.path().join("z.jpg").exists());
        assert!(tmp.path().join("z.b.md").exists());
    }

    #[test]
    fn inventory_walks_once_for_both_lists() {
        let (tmp, vault) = vault();
        fs::create_dir_all(tmp.path().join("notes")).unwrap();
        fs::write(tmp.path().join("notes/a.md"), "").unwrap();

        let (folders, files) = vault.inventory().unwrap();
        assert_eq!(folders, vault.list_folders().unwrap());
        assert_eq!(files, vault.list_files().unwrap());
        assert_eq!(files, vec![file_ref("notes/a.md")]);
    }

    #[test]
    fn hierarchy_renames_follow_folder_moves() {
        let naming = NoteNaming::default();
        let files = vec![file_ref("a.md"), file_ref("a.x.md")];
        let pairs = hierarchy_renames(&naming, &files, "a.md", "inbox/a.md");
        assert_eq!(
            pairs,
            vec![
                ("a.md".to_string(), "inbox/a.md".to_string()),
                ("a.x.md".to_string(), "inbox/a.x.md".to_string()),
            ]
        );
    }
}
