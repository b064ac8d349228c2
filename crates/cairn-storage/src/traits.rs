//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The caller's byte stream failed before the object was complete.
    #[error("Source stream interrupted: {0}")]
    SourceInterrupted(#[source] std::io::Error),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Incoming bytes for a streamed write.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + 'a>>;

/// Outcome of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// All storage backends must implement this trait. Writes are streamed: a
/// backend pulls chunks only as fast as it can upload them and never holds
/// the whole object in memory.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `data` to `storage_key` with the given content type.
    ///
    /// Characters the backend cannot hold in a key are percent-encoded, so
    /// the returned `StoredObject::key` is the key the object actually lives
    /// under and the one every other method expects. Refuses to overwrite an
    /// existing object (`AlreadyExists`). On any failure the partial upload
    /// is aborted, so nothing becomes readable under the key.
    async fn store_stream<'a>(
        &self,
        storage_key: &str,
        content_type: &str,
        data: ByteStream<'a>,
    ) -> StorageResult<StoredObject>;

    /// Delete a file by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Public URL for a stored key. Deterministic, performs no I/O.
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Round-trip to the backend without touching real objects.
    async fn health_check(&self) -> StorageResult<()> {
        self.exists(".cairn-health").await.map(|_| ())
    }
}
