//! Error types module
//!
//! Every failure an ingest or listing call can produce is a variant of
//! [`AppError`]. Variants self-describe their HTTP presentation through
//! [`ErrorMetadata`] so the edge never has to match on them again.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether the whole call can be retried as-is
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid folder: {0}")]
    InvalidFolder(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("File is too large: limit is {max_bytes} bytes")]
    FileTooLarge { max_bytes: u64 },

    #[error("Storage write failed for {key}: {message}")]
    StorageWriteFailed { key: String, message: String },

    #[error("Metadata persist failed for {key}: {message}")]
    MetadataPersistFailed { key: String, message: String },

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Storage key already in use: {0}")]
    UniqueKeyCollision(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation Error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidFolder(_) => (
            400,
            "INVALID_FOLDER",
            false,
            Some("Use one of the supported folders: images, downloads"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidFileFormat(_) => (
            400,
            "INVALID_FILE_FORMAT",
            false,
            Some("Upload a file whose content type the folder accepts"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileTooLarge { .. } => (
            400,
            "FILE_TOO_LARGE",
            false,
            Some("Reduce the file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::StorageWriteFailed { .. } => (
            500,
            "STORAGE_WRITE_FAILED",
            true,
            Some("Retry the upload after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::MetadataPersistFailed { .. } => (
            500,
            "METADATA_PERSIST_FAILED",
            true,
            Some("Retry the upload after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidSortField(_) => (
            400,
            "INVALID_SORT_FIELD",
            false,
            Some("Sort by createdAt or omit sortBy"),
            false,
            LogLevel::Debug,
        ),
        AppError::UniqueKeyCollision(_) => (
            500,
            "UNIQUE_KEY_COLLISION",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, None, false, LogLevel::Debug),
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidFolder(_) => "InvalidFolder",
            AppError::InvalidFileFormat(_) => "InvalidFileFormat",
            AppError::FileTooLarge { .. } => "FileTooLarge",
            AppError::StorageWriteFailed { .. } => "StorageWriteFailed",
            AppError::MetadataPersistFailed { .. } => "MetadataPersistFailed",
            AppError::InvalidSortField(_) => "InvalidSortField",
            AppError::UniqueKeyCollision(_) => "UniqueKeyCollision",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Database(_) => "Database",
            AppError::Internal(_) => "Internal",
        }
    }

    /// True for errors caused by the caller's input. These are never retried.
    pub fn is_caller_error(&self) -> bool {
        self.http_status_code() < 500
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        if self.is_sensitive() {
            return "Internal Server Error".to_string();
        }
        match self {
            AppError::InvalidFolder(ref msg)
            | AppError::InvalidFileFormat(ref msg)
            | AppError::InvalidSortField(ref msg)
            | AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::FileTooLarge { .. } => "File is too large.".to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }
}
