//! Error types for Printdown
//!
//! This module defines all custom error types used throughout the application.
//! Error types are organized by category: item-level rendering failures stay
//! inside the adapters, document-level failures (file I/O, export) surface
//! once per operation through these types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main application error type encompassing all error categories
#[derive(Error, Debug)]
pub enum AppError {
    /// File I/O related errors
    #[error(transparent)]
    FileIO(#[from] FileError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session persistence errors
    #[error(transparent)]
    Session(#[from] SessionError),

    /// File watcher errors
    #[error(transparent)]
    Watcher(#[from] WatcherError),

    /// PDF export errors
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Generic unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// File I/O related errors
#[derive(Error, Debug)]
pub enum FileError {
    /// File not found at specified path
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when accessing file
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// File is too large to open
    #[error("File too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// Error reading file
    #[error("Could not read file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing file
    #[error("Could not save file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error reading file metadata
    #[error("Could not read file information: {path}")]
    StatError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory operation error
    #[error("Directory error: {path}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path is not a file
    #[error("Path is not a file: {path}")]
    NotAFile { path: PathBuf },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error loading configuration file
    #[error("Could not load configuration: {0}")]
    LoadError(String),

    /// Error saving configuration
    #[error("Could not save configuration: {0}")]
    SaveError(String),

    /// Error parsing configuration
    #[error("Invalid configuration format: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Configuration directory error
    #[error("Could not access configuration directory")]
    DirectoryError,
}

/// Session persistence errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Error reading the session file
    #[error("Failed to load session: {0}")]
    LoadError(String),

    /// Error parsing session data
    #[error("Failed to parse session: {0}")]
    ParseError(String),

    /// Session was written by a newer version of the application
    #[error("Unsupported session version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Error saving session
    #[error("Failed to save session: {0}")]
    SaveError(String),

    /// Could not determine session directory
    #[error("Could not determine session directory")]
    DirectoryError,
}

/// File watcher errors
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Could not initialize file watcher
    #[error("Could not start file watcher: {0}")]
    InitError(String),

    /// Could not watch path
    #[error("Could not watch path: {path}")]
    WatchError {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Failure of a single math or diagram item inside a rendering engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine rejected the source (syntax error, unknown construct)
    #[error("{0}")]
    Syntax(String),

    /// The engine did not finish within the configured timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The engine process could not be run or crashed
    #[error("engine failed: {0}")]
    Failed(String),
}

/// PDF export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing to export
    #[error("No document to export")]
    NoDocument,

    /// The print-to-PDF primitive failed
    #[error("PDF generation failed: {0}")]
    PrintFailed(String),

    /// The print-to-PDF primitive produced no bytes
    #[error("PDF generation produced an empty document")]
    EmptyOutput,

    /// Writing the PDF failed
    #[error("Failed to save PDF file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The written PDF file is missing or empty
    #[error("PDF file was not written: {path}")]
    NotWritten { path: PathBuf },

    /// A page geometry value could not be interpreted
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;

impl FileError {
    /// Build a read error, mapping well-known I/O kinds to dedicated variants
    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            _ => FileError::ReadError { path, source },
        }
    }

    /// Create a user-friendly error message suitable for display in dialogs
    pub fn user_message(&self) -> String {
        match self {
            FileError::NotFound(_) => {
                "The file could not be found. It may have been moved or deleted.".to_string()
            }
            FileError::PermissionDenied { .. } => {
                "You don't have permission to access this file. Check file permissions.".to_string()
            }
            FileError::FileTooLarge { max_size, .. } => {
                format!(
                    "This file is too large to open. Maximum file size is {} bytes.",
                    max_size
                )
            }
            FileError::WriteError { .. } => {
                "Could not save the file. Check disk space and permissions.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl ExportError {
    /// Message shown in the blocking export error dialog
    pub fn user_message(&self) -> String {
        match self {
            ExportError::WriteError { source, .. } => {
                format!("Failed to save PDF file: {}", source)
            }
            _ => self.to_string(),
        }
    }
}
