use std::fmt;
use std::path::{Path, PathBuf};

/// Fatal errors for a transform run.
///
/// Shape problems inside the fetch value are never errors; they are recorded in the
/// debug report instead. Only these conditions stop a run.
#[derive(Debug)]
pub enum AppError {
    /// The top-level input document is not valid JSON.
    InvalidInput(serde_json::Error),
    /// Reading input or writing an output artifact failed.
    Io {
        /// Path being read or written (`-` for stdin).
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// Encoding an output document failed.
    Serialization(serde_json::Error),
    /// Invalid configuration.
    Config(String),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidInput(_) => 1,
            AppError::Io { .. } => 2,
            AppError::Serialization(_) => 3,
            AppError::Config(_) => 4,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(e) => write!(f, "Invalid input document: {}", e),
            AppError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
            AppError::Serialization(e) => write!(f, "Serialization error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::InvalidInput(e) | AppError::Serialization(e) => Some(e),
            AppError::Io { source, .. } => Some(source),
            AppError::Config(_) => None,
        }
    }
}

/// Extension trait attaching a path to I/O failures.
pub trait ResultExt<T> {
    /// Convert an I/O error into `AppError::Io` for `path`.
    fn with_path(self, path: &Path) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T, AppError> {
        self.map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
