use thiserror::Error;
use tracing::{error, warn};

/// Error severity for logging and UI surfacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning, // recoverable, engine degrades to a default
    Error,
}

/// Domain-specific errors for theme-kit
#[derive(Error, Debug)]
pub enum ThemeKitError {
    #[error("storage access failed for key '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file is not valid JSON: {0}")]
    StorageFormat(#[from] serde_json::Error),

    #[error("appearance signal error: {0}")]
    Signal(String),
}

impl ThemeKitError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Persistence is best-effort; the engine falls back to the
            // configured default and keeps running.
            Self::Storage { .. } => ErrorSeverity::Warning,
            Self::StorageFormat(_) => ErrorSeverity::Warning,
            Self::Signal(_) => ErrorSeverity::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, ThemeKitError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the caller doesn't need to
/// know.
///
/// # Examples
///
/// ```ignore
/// use theme_kit::error::ResultExt;
///
/// // Persist if possible, continue either way
/// storage.set("theme", "dark").warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_warnings() {
        let err = ThemeKitError::Storage {
            key: "theme".into(),
            source: std::io::Error::other("disk gone"),
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_warn_on_err_swallows() {
        let result: std::result::Result<(), &str> = Err("nope");
        assert!(result.warn_on_err().is_none());

        let result: std::result::Result<u32, &str> = Ok(7);
        assert_eq!(result.warn_on_err(), Some(7));
    }
}
