use crate::multipart::{
    content_type_attributes, put_stream, stored_location, write_location,
};
use crate::traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
use crate::url::public_url;
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::memory::InMemory;
use object_store::Error as ObjectStoreError;
use futures::TryStreamExt;
use object_store::{ObjectStore, ObjectStoreExt};
use std::sync::Arc;

/// In-process storage for development and tests. Contents are lost on exit.
#[derive(Clone)]
pub struct MemoryStorage {
    store: Arc<InMemory>,
    public_base_url: String,
}

impl MemoryStorage {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        MemoryStorage {
            store: Arc::new(InMemory::new()),
            public_base_url: public_base_url.into(),
        }
    }

    /// Read an object back. Used by tests to check what was stored.
    pub async fn read(&self, storage_key: &str) -> StorageResult<Option<Vec<u8>>> {
        let location = stored_location(storage_key)?;
        match self.store.get(&location).await {
            Ok(result) => {
                let bytes = result
                    .bytes()
                    .await
                    .map_err(|e| StorageError::BackendError(e.to_string()))?;
                Ok(Some(bytes.to_vec()))
            }
            Err(ObjectStoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    /// Every stored key, sorted.
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .store
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn store_stream<'a>(
        &self,
        storage_key: &str,
        content_type: &str,
        data: ByteStream<'a>,
    ) -> StorageResult<StoredObject> {
        let location = write_location(storage_key);
        let size_bytes = put_stream(
            self.store.as_ref(),
            &location,
            content_type_attributes(content_type),
            data,
        )
        .await?;

        tracing::debug!(
            key = %location,
            size_bytes = size_bytes,
            "Memory store upload successful"
        );

        Ok(StoredObject {
            url: self.public_url(location.as_ref()),
            key: location.into(),
            size_bytes,
        })
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let location = stored_location(storage_key)?;
        self.store
            .delete(&location)
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))
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
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    #[tokio::test]
    async fn test_store_and_read_back() {
        let storage = MemoryStorage::new("https://cdn.example.com/");
        let data: ByteStream<'static> = Box::pin(stream::iter(vec![Ok(Bytes::from_static(
            b"\x89PNG",
        ))]));

        let stored = storage
            .store_stream("images/t-logopng.png", "image/png", data)
            .await
            .unwrap();

        assert_eq!(stored.url, "https://cdn.example.com/images/t-logopng.png");
        assert_eq!(stored.size_bytes, 4);
        assert_eq!(
            storage.read("images/t-logopng.png").await.unwrap(),
            Some(b"\x89PNG".to_vec())
        );
        assert!(storage.exists("images/t-logopng.png").await.unwrap());

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["images/t-logopng.png".to_string()]
        );

        storage.delete("images/t-logopng.png").await.unwrap();
        assert!(!storage.exists("images/t-logopng.png").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_returned_key_is_where_the_object_lives() {
        let storage = MemoryStorage::new("https://cdn.example.com");
        let data: ByteStream<'static> =
            Box::pin(stream::iter(vec![Ok(Bytes::from_static(b"odd"))]));

        let stored = storage
            .store_stream("images/t-photopng.p%n~g", "image/png", data)
            .await
            .unwrap();

        assert_eq!(stored.key, "images/t-photopng.p%25n%7Eg");
        assert_eq!(storage.keys().await.unwrap(), vec![stored.key.clone()]);
        assert_eq!(
            storage.read(&stored.key).await.unwrap(),
            Some(b"odd".to_vec())
        );
        assert_eq!(
            stored.url,
            "https://cdn.example.com/images/t-photopng.p%2525n%257Eg"
        );

        storage.delete(&stored.key).await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let storage = MemoryStorage::new("http://localhost");
        storage.health_check().await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }
}
