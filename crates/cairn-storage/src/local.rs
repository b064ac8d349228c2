use crate::multipart::{put_stream, stored_location, write_location};
use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::url::public_url;
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::local::LocalFileSystem;
use object_store::Error as ObjectStoreError;
use object_store::{Attributes, ObjectStoreExt};
use std::path::PathBuf;
use tokio::fs;

/// Local filesystem storage implementation
///
/// Objects live under `base_path`; something else (a reverse proxy or CDN)
/// serves them at `public_base_url`. The filesystem cannot hold content types,
/// so the declared type is only logged.
#[derive(Debug)]
pub struct LocalStorage {
    store: LocalFileSystem,
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/cairn/uploads")
    /// * `public_base_url` - Base URL for serving files (e.g., "http://localhost:3333/files")
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(LocalStorage {
            store,
            base_path,
            public_base_url,
        })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store_stream<'a>(
        &self,
        storage_key: &str,
        content_type: &str,
        data: ByteStream<'a>,
    ) -> StorageResult<StoredObject> {
        let start = std::time::Instant::now();

        let location = write_location(storage_key);

        let size_bytes = put_stream(&self.store, &location, Attributes::new(), data)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    base_path = %self.base_path.display(),
                    key = %location,
                    "Local stream upload failed"
                );
            })?;

        tracing::info!(
            base_path = %self.base_path.display(),
            key = %location,
            content_type = %content_type,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local stream upload successful"
        );

        Ok(StoredObject {
            url: self.public_url(location.as_ref()),
            key: location.into(),
            size_bytes,
        })
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let location = stored_location(storage_key)?;
        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = stored_location(storage_key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        public_url(&self.public_base_url, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
