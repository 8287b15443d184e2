//! Expanded-folder state persisted between sessions, one entry per vault.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// State file name inside the data directory.
pub const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    #[serde(default)]
    pub expanded: Vec<String>,
    #[serde(default)]
    pub last_selected: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    /// Keyed by the vault's absolute path.
    #[serde(default)]
    pub vaults: BTreeMap<String, VaultState>,
}

/// Reads and writes the state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory, e.g. `~/.local/share/vault-tree`.
    pub fn in_data_dir() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join("vault-tree").join(STATE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty state; a corrupt one is an error.
    pub fn read(&self) -> Result<StateFile> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load(&self, vault: &Path) -> Result<VaultState> {
        let mut file = self.read()?;
        Ok(file.vaults.remove(&key(vault)).unwrap_or_default())
    }

    /// Replace the entry of one vault, keeping the others.
    pub fn save(&self, vault: &Path, state: VaultState) -> Result<()> {
        let mut file = self.read().unwrap_or_default();
        file.vaults.insert(key(vault), state);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn key(vault: &Path) -> String {
    vault.display().to_string()
}
