//! Pooled, windowed rendering of the flattened tree.

pub mod engine;
pub mod reveal;
pub mod row;
pub mod window;

pub use engine::{EngineOptions, NavKey, Phase, RenderStats, Viewport, VirtualTree};
pub use row::{LineRenderer, NoopHandler, RowEventHandler, RowFlags, RowRenderer, RowSlot};
pub use window::{compute_window, VisibleWindow};
