use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from vault operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The filesystem watcher could not be started.
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Persisted view state could not be encoded or decoded.
    #[error("State error: {0}")]
    State(#[from] serde_json::Error),

    /// A vault operation was refused before touching the disk.
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn invalid_path_error_display() {
        let err = AppError::InvalidPath("/nonexistent".into());
        assert_eq!(err.to_string(), "Invalid path: /nonexistent");
    }

    #[test]
    fn state_error_conversion() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err: AppError = json_err.into();
        assert!(matches!(err, AppError::State(_)));
        assert!(err.to_string().starts_with("State error:"));
    }

    #[test]
    fn rejected_displays_bare_message() {
        let err = AppError::Rejected("a.md already exists".into());
        assert_eq!(err.to_string(), "a.md already exists");
    }
}
