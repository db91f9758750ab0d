//! Global error handling for foldercat
//!
//! Only a bad root is fatal to a run. Everything that goes wrong below the
//! root (an unlistable subdirectory, an unreadable file, a failed minify pass)
//! is absorbed into the result model instead of surfacing here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::clipboard::ClipboardError;

/// Global error type for foldercat operations
#[derive(Error, Debug)]
pub enum FolderCatError {
    /// Root path does not exist
    #[error("Path does not exist: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Root path exists but is not a directory
    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Root directory exists but cannot be listed
    #[error("Could not list directory {}: {source}", .path.display())]
    RootUnlistable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTML rendering errors
    #[error("HTML error: {0}")]
    Html(#[from] quick_xml::Error),

    /// Regular expression errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Clipboard errors
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Reader pool errors
    #[error("Reader error: {0}")]
    Reader(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl FolderCatError {
    /// Whether this error means the run root itself is unusable
    pub fn is_invalid_root(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath(_) | Self::NotADirectory(_) | Self::RootUnlistable { .. }
        )
    }
}

/// Specialized Result type for foldercat operations
pub type Result<T> = std::result::Result<T, FolderCatError>;

/// Creates a FolderCatError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::FolderCatError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            FolderCatError::Unexpected(format!("{}: {}", context, e))
        })
    }
}
