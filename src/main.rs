mod app;
mod commands;
mod components;
mod config;
mod error;
mod event;
mod fs;
mod handler;
mod logging;
mod persist;
mod tree;
mod tui;
mod ui;
mod vault;
mod view;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::app::{App, AppSettings};
use crate::config::{AppConfig, GeneralConfig, WatcherConfig};
use crate::event::{ActivationSender, Event, EventHandler};
use crate::fs::watcher::FsWatcher;
use crate::logging::TracingLog;
use crate::persist::StateStore;
use crate::tui::{install_panic_hook, Tui};
use crate::vault::DiskVault;

/// Browse a notes vault as a folder and dotted-name hierarchy.
#[derive(Parser, Debug)]
#[command(name = "vt", version, about)]
struct Cli {
    /// Vault directory (defaults to the configured vault, then the current directory)
    path: Option<PathBuf>,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// Disable mouse support
    #[arg(long)]
    no_mouse: bool,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Flags expressed as a partial config that overrides every file source.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                ..GeneralConfig::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..WatcherConfig::default()
            },
            ..AppConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let _log_guard = dirs::data_dir().and_then(|dir| {
        logging::init(
            &dir.join("vault-tree").join("logs"),
            logging::parse_level(config.log_level()),
        )
    });

    let requested = cli
        .path
        .clone()
        .or_else(|| config.default_vault().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let path = requested.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", requested.display()))
    })?;
    tracing::info!(target: logging::LOG_TARGET, "opening vault {}", path.display());

    let vault = DiskVault::new(&path, config.ignore_patterns())?;

    install_panic_hook();

    // Dropping `tui` restores the terminal on every early return below.
    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    let mut app = App::new(
        vault,
        AppSettings::from_config(&config),
        Box::new(ActivationSender::new(event_tx.clone())),
        Arc::new(TracingLog),
        StateStore::in_data_dir(),
        tui.viewport()?,
    )?;

    let watcher = if config.watcher_enabled() {
        match FsWatcher::new(
            &path,
            Duration::from_millis(config.debounce_ms()),
            config.ignore_patterns(),
            fs::watcher::DEFAULT_FLOOD_THRESHOLD,
            event_tx.clone(),
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                let e = error::AppError::from(e);
                tracing::warn!(target: logging::LOG_TARGET, "{}", e);
                app.watcher_active = false;
                app.set_error(format!("⚠ {}", e));
                None
            }
        }
    } else {
        app.watcher_active = false;
        None
    };

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.tick(),
            // The next draw measures the new panel size.
            Event::Resize(_, _) => {}
            Event::FsChange(paths) => app.handle_fs_change(paths),
            Event::Activated(activation) => app.handle_activation(activation),
        }

        // `w` toggles auto-refresh.
        if let Some(ref watcher) = watcher {
            if app.watcher_active && !watcher.is_active() {
                watcher.resume();
            } else if !app.watcher_active && watcher.is_active() {
                watcher.pause();
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    tui.restore()?;
    Ok(())
}
