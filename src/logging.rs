//! Logging port used by the tree view, and the tracing sink behind it.
//!
//! The view code only talks to [`LogPort`]. The shell decides where records
//! go by installing a subscriber with [`init`] and handing out [`TracingLog`].

use std::path::Path;

use tracing::{event, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{fmt, prelude::*};

/// Target for all records emitted through the port.
pub const LOG_TARGET: &str = "vault_tree";

/// Narrow logging interface the core depends on.
pub trait LogPort: Send + Sync {
    fn log(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards records to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogPort for TracingLog {
    fn log(&self, message: &str) {
        event!(target: LOG_TARGET, Level::INFO, "{}", message);
    }

    fn error(&self, message: &str) {
        event!(target: LOG_TARGET, Level::ERROR, "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl LogPort for NullLog {
    fn log(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Parse a level name from config; unknown names fall back to `info`.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// Install a daily rolling file subscriber under `log_dir`.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
/// Returns the writer guard, which must live as long as logging is wanted.
/// If the directory cannot be created, no subscriber is installed.
pub fn init(log_dir: &Path, level: LevelFilter) -> Option<WorkerGuard> {
    std::fs::create_dir_all(log_dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(14)
        .filename_prefix("vault-tree")
        .filename_suffix("log")
        .build(log_dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = Targets::new().with_default(level);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(layer).try_init().ok()?;
    Some(guard)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::LogPort;

    /// Captures records for assertions.
    #[derive(Debug, Default)]
    pub struct MemoryLog {
        pub records: Mutex<Vec<String>>,
    }

    impl MemoryLog {
        pub fn lines(&self) -> Vec<String> {
            self.records.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    impl LogPort for MemoryLog {
        fn log(&self, message: &str) {
            if let Ok(mut records) = self.records.lock() {
                records.push(format!("log: {}", message));
            }
        }

        fn error(&self, message: &str) {
            if let Ok(mut records) = self.records.lock() {
                records.push(format!("error: {}", message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryLog;
    use super::*;

    #[test]
    fn parse_level_names() {
        assert_eq!(parse_level("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARN"), LevelFilter::WARN);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
        assert_eq!(parse_level("nonsense"), LevelFilter::INFO);
    }

    #[test]
    fn memory_log_records_both_levels() {
        let log = MemoryLog::default();
        log.log("hello");
        log.error("boom");
        assert_eq!(log.lines(), vec!["log: hello", "error: boom"]);
    }

    #[test]
    fn null_and_tracing_ports_accept_records() {
        NullLog.log("ignored");
        NullLog.error("ignored");
        TracingLog.log("no subscriber installed");
    }
}
