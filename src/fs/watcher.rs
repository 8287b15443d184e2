use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;

/// Default patterns to ignore when watching the vault.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".git", ".obsidian", ".trash", "node_modules"];

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default flood threshold (events per debounce window).
pub const DEFAULT_FLOOD_THRESHOLD: usize = 100;

/// Filesystem watcher that monitors the vault root and sends change events.
pub struct FsWatcher {
    /// Whether the watcher is currently forwarding events.
    active: Arc<AtomicBool>,
    /// Handle to the debouncer (dropped to stop watching).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Watch `root` recursively.
    ///
    /// Events are debounced by `debounce_duration` and sent via `event_tx`.
    /// Paths matching any of `ignore_patterns` are dropped. If more than
    /// `flood_threshold` paths arrive in one window they collapse into a
    /// single event for the root.
    pub fn new(
        root: &Path,
        debounce_duration: Duration,
        ignore_patterns: Vec<String>,
        flood_threshold: usize,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let active = Arc::new(AtomicBool::new(true));
        let active_clone = active.clone();
        let root_path = root.to_path_buf();

        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                if !active_clone.load(Ordering::Relaxed) {
                    return;
                }

                match result {
                    Ok(events) => {
                        let paths: Vec<PathBuf> = events
                            .iter()
                            .filter(|e| e.kind == DebouncedEventKind::Any)
                            .map(|e| e.path.clone())
                            .filter(|p| !should_ignore(p, &ignore_patterns))
                            .collect();

                        if paths.is_empty() {
                            return;
                        }

                        let paths = collapse_flood(paths, flood_threshold, &root_path);
                        let _ = event_tx.send(Event::FsChange(paths));
                    }
                    Err(e) => {
                        tracing::warn!(target: "vault_tree", "watcher error: {}", e);
                    }
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;

        Ok(Self {
            active,
            _debouncer: debouncer,
        })
    }

    /// Pause event forwarding (watcher stays alive to avoid re-creating inotify watches).
    pub fn pause(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Resume event forwarding.
    pub fn resume(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// Check if a path should be ignored based on ignore patterns.
///
/// A path is ignored if any of its components match any ignore pattern exactly.
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    path.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            patterns.iter().any(|p| name == p.as_str())
        }
        _ => false,
    })
}

/// Replace an oversized burst with a single refresh of `root`.
pub fn collapse_flood(paths: Vec<PathBuf>, threshold: usize, root: &Path) -> Vec<PathBuf> {
    if paths.len() > threshold {
        vec![root.to_path_buf()]
    } else {
        paths
    }
}

/// Paths recently touched by the UI itself, whose watcher echo is dropped.
#[derive(Debug)]
pub struct EchoFilter {
    window: Duration,
    recent: HashMap<PathBuf, Instant>,
}

impl EchoFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            recent: HashMap::new(),
        }
    }

    /// Remember paths the UI just changed.
    pub fn record<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I, now: Instant) {
        for path in paths {
            self.recent.insert(path, now);
        }
    }

    /// Paths of a watcher batch that were not caused by the UI. Expired
    /// entries are forgotten on the way.
    pub fn unexpected(&mut self, paths: Vec<PathBuf>, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        self.recent
            .retain(|_, at| now.saturating_duration_since(*at) <= window);
        paths
            .into_iter()
            .filter(|p| !self.recent.contains_key(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_git_directory() {
        let patterns = vec![".git".to_string()];
        assert!(should_ignore(Path::new("/vault/.git/HEAD"), &patterns));
        assert!(should_ignore(
            Path::new("/vault/.git/objects/abc"),
            &patterns
        ));
    }

    #[test]
    fn ignore_obsidian_settings() {
        let patterns: Vec<String> = DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect();
        assert!(should_ignore(
            Path::new("/vault/.obsidian/workspace.json"),
            &patterns
        ));
        assert!(!should_ignore(Path::new("/vault/notes/a.b.md"), &patterns));
    }

    #[test]
    fn empty_patterns_ignore_nothing() {
        let patterns: Vec<String> = vec![];
        assert!(!should_ignore(Path::new("/vault/.git/HEAD"), &patterns));
    }

    #[test]
    fn partial_name_does_not_match() {
        let patterns = vec![".trash".to_string()];
        assert!(!should_ignore(
            Path::new("/vault/.trash2/file.md"),
            &patterns
        ));
    }

    #[test]
    fn flood_threshold_collapses_events() {
        let paths: Vec<PathBuf> = (0..200)
            .map(|i| PathBuf::from(format!("/vault/n{}.md", i)))
            .collect();
        let root = PathBuf::from("/vault");
        let collapsed = collapse_flood(paths, DEFAULT_FLOOD_THRESHOLD, &root);
        assert_eq!(collapsed, vec![root]);
    }

    #[test]
    fn below_flood_threshold_keeps_individual_paths() {
        let paths: Vec<PathBuf> = (0..50)
            .map(|i| PathBuf::from(format!("/vault/n{}.md", i)))
            .collect();
        let kept = collapse_flood(paths, DEFAULT_FLOOD_THRESHOLD, Path::new("/vault"));
        assert_eq!(kept.len(), 50);
    }

    #[test]
    fn echo_filter_drops_recent_ui_paths() {
        let start = Instant::now();
        let mut filter = EchoFilter::new(Duration::from_millis(1000));
        filter.record(
            vec![PathBuf::from("/v/a.md"), PathBuf::from("/v/b.md")],
            start,
        );
        let left = filter.unexpected(
            vec![PathBuf::from("/v/a.md"), PathBuf::from("/v/c.md")],
            start + Duration::from_millis(400),
        );
        assert_eq!(left, vec![PathBuf::from("/v/c.md")]);
    }

    #[test]
    fn echo_filter_entries_expire() {
        let start = Instant::now();
        let mut filter = EchoFilter::new(Duration::from_millis(500));
        filter.record(vec![PathBuf::from("/v/a.md")], start);
        let left = filter.unexpected(
            vec![PathBuf::from("/v/a.md")],
            start + Duration::from_secs(2),
        );
        assert_eq!(left, vec![PathBuf::from("/v/a.md")]);
    }

    #[tokio::test]
    async fn watcher_starts_paused_and_resumes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let watcher = FsWatcher::new(
            tmp.path(),
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            Vec::new(),
            DEFAULT_FLOOD_THRESHOLD,
            tx,
        )
        .unwrap();
        assert!(watcher.is_active());
        watcher.pause();
        assert!(!watcher.is_active());
        watcher.resume();
        assert!(watcher.is_active());
    }
}
