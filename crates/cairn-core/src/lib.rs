//! Cairn Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by every Cairn component. It performs no I/O.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    FolderPolicy, ListingParams, NewUpload, PageRequest, SortDirection, SortField, UploadFilter,
    UploadFolder, UploadPage, UploadRecord, UploadSort,
};
pub use storage_types::StorageBackend;
