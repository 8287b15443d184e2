use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::tree::FlatRow;
use crate::view::RowEventHandler;

/// A row activated in the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A branch was toggled open or closed.
    Open(FlatRow),
    /// A leaf was chosen.
    Select(FlatRow),
}

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// Filesystem change detected by watcher.
    FsChange(Vec<PathBuf>),
    /// Row activation forwarded from the tree view.
    Activated(Activation),
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::task::spawn_blocking(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                    Ok(CrosstermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    _ => continue,
                }
            } else {
                Event::Tick
            };
            if event_tx.send(event).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// Get a sender clone for the watcher and the tree view.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}

/// Forwards tree view activations into the event loop.
#[derive(Debug, Clone)]
pub struct ActivationSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl ActivationSender {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    fn send(&self, activation: Activation) {
        if self.tx.send(Event::Activated(activation)).is_err() {
            tracing::debug!(target: "vault_tree", "event loop gone, activation dropped");
        }
    }
}

impl RowEventHandler for ActivationSender {
    fn on_open(&mut self, row: &FlatRow) {
        self.send(Activation::Open(row.clone()));
    }

    fn on_select(&mut self, row: &FlatRow) {
        self.send(Activation::Select(row.clone()));
    }
}
