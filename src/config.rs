//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--no-watcher`, `--no-mouse`)
//! 2. `$VAULT_TREE_CONFIG` environment variable (path to config file)
//! 3. Vault-local `.vault-tree.toml` in the current working directory
//! 4. Global `~/.config/vault-tree/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::watcher::DEFAULT_IGNORE_PATTERNS;
use crate::tree::naming::DEFAULT_NOTE_EXTENSION;
use crate::view::EngineOptions;
use crate::tree::NoteNaming;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Vault opened when no path is given on the command line.
    pub default_vault: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Reveal the focused note again after every rebuild.
    pub auto_reveal: Option<bool>,
    /// Restore expanded folders from the previous session.
    pub restore_expanded: Option<bool>,
    /// Confirm before delete operations.
    pub confirm_delete: Option<bool>,
}

/// Tree view settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Height of one row in terminal cells.
    pub row_height: Option<usize>,
    /// Rows bound above and below the viewport.
    pub buffer_rows: Option<usize>,
    /// Extension of notes and of synthesized dotted ancestors.
    pub note_extension: Option<String>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
    /// Path components skipped by the watcher and the inventory.
    pub ignore_patterns: Option<Vec<String>>,
}

/// Log file settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub watcher: WatcherConfig,
    pub log: LogConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default row height in cells.
pub const DEFAULT_ROW_HEIGHT: usize = 1;
/// Default number of buffered rows on each side of the viewport.
pub const DEFAULT_BUFFER_ROWS: usize = 4;
/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that one is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("VAULT_TREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".vault-tree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("vault-tree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_vault: other
                    .general
                    .default_vault
                    .clone()
                    .or(self.general.default_vault),
                mouse: other.general.mouse.or(self.general.mouse),
                auto_reveal: other.general.auto_reveal.or(self.general.auto_reveal),
                restore_expanded: other
                    .general
                    .restore_expanded
                    .or(self.general.restore_expanded),
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
            },
            tree: TreeConfig {
                row_height: other.tree.row_height.or(self.tree.row_height),
                buffer_rows: other.tree.buffer_rows.or(self.tree.buffer_rows),
                note_extension: other
                    .tree
                    .note_extension
                    .clone()
                    .or(self.tree.note_extension),
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
                ignore_patterns: other
                    .watcher
                    .ignore_patterns
                    .clone()
                    .or(self.watcher.ignore_patterns),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher sources overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn default_vault(&self) -> Option<&str> {
        self.general.default_vault.as_deref()
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn auto_reveal(&self) -> bool {
        self.general.auto_reveal.unwrap_or(true)
    }

    pub fn restore_expanded(&self) -> bool {
        self.general.restore_expanded.unwrap_or(true)
    }

    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    /// Row height, never below one cell.
    pub fn row_height(&self) -> usize {
        self.tree.row_height.unwrap_or(DEFAULT_ROW_HEIGHT).max(1)
    }

    pub fn buffer_rows(&self) -> usize {
        self.tree.buffer_rows.unwrap_or(DEFAULT_BUFFER_ROWS)
    }

    pub fn note_extension(&self) -> &str {
        self.tree
            .note_extension
            .as_deref()
            .filter(|e| !e.trim_start_matches('.').is_empty())
            .unwrap_or(DEFAULT_NOTE_EXTENSION)
    }

    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    pub fn ignore_patterns(&self) -> Vec<String> {
        match &self.watcher.ignore_patterns {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn naming(&self) -> NoteNaming {
        NoteNaming::new(self.note_extension())
    }

    /// Tree view options derived from the `[tree]` section.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            row_height: self.row_height(),
            buffer_rows: self.buffer_rows(),
            naming: self.naming(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
