use std::sync::Arc;

use cairn_core::constants::{MAX_EXTENSION_BYTES, MAX_FILE_NAME_BYTES};
use cairn_core::models::normalize_content_type;
use cairn_core::{AppError, FolderPolicy, NewUpload};
use cairn_db::UploadStore;
use cairn_storage::keys::{base_name, extension};
use cairn_storage::{derive_storage_key, Storage, StorageError};

use super::limit::SizeLimitedStream;
use super::types::{IncomingFile, IngestStage, IngestedUpload};

/// Streams one file to storage and records it.
///
/// Dependencies are injected so tests can swap in in-memory stores. Nothing
/// is retried here: each call derives a fresh key, so the caller can retry a
/// failed call as a whole.
#[derive(Clone)]
pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    uploads: Arc<dyn UploadStore>,
    folder_policy: FolderPolicy,
    max_file_size_bytes: u64,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        uploads: Arc<dyn UploadStore>,
        folder_policy: FolderPolicy,
        max_file_size_bytes: u64,
    ) -> Self {
        Self {
            storage,
            uploads,
            folder_policy,
            max_file_size_bytes,
        }
    }

    /// Ingest `file` as a named upload.
    ///
    /// The returned record is already persisted. A content type no folder
    /// accepts is rejected before the stream is read.
    #[tracing::instrument(
        skip(self, file),
        fields(file_name = %file.file_name, content_type = %file.content_type)
    )]
    pub async fn ingest(&self, file: IncomingFile<'_>) -> Result<IngestedUpload, AppError> {
        let IncomingFile {
            file_name,
            content_type,
            folder,
            data,
        } = file;

        let folder = check_file_name(&file_name)
            .and_then(|()| self.folder_policy.resolve(folder, &content_type))
            .inspect_err(|e| {
                tracing::debug!(stage = %IngestStage::Validating, error = %e, "Upload rejected");
            })?;
        let content_type = normalize_content_type(&content_type);
        let storage_key = derive_storage_key(folder, &file_name);

        tracing::debug!(
            stage = %IngestStage::Streaming,
            folder = %folder,
            key = %storage_key,
            "Streaming upload to storage"
        );

        let (limited, probe) = SizeLimitedStream::new(data, self.max_file_size_bytes);
        let stored = self
            .storage
            .store_stream(&storage_key, &content_type, limited.into_byte_stream())
            .await;

        if probe.exceeded() {
            if let Ok(object) = &stored {
                self.discard(&object.key).await;
            }
            tracing::debug!(
                stage = %IngestStage::Streaming,
                key = %storage_key,
                max_bytes = self.max_file_size_bytes,
                "Upload exceeded size limit"
            );
            return Err(AppError::FileTooLarge {
                max_bytes: self.max_file_size_bytes,
            });
        }

        let stored = stored.map_err(|e| storage_failure(&storage_key, e))?;

        tracing::debug!(
            stage = %IngestStage::Persisting,
            key = %stored.key,
            size_bytes = stored.size_bytes,
            "Persisting upload record"
        );

        let record = self
            .uploads
            .insert(NewUpload::new(file_name, &stored.key, &stored.url))
            .await
            .map_err(|e| {
                // The bytes stay in storage without a record.
                tracing::error!(
                    stage = %IngestStage::Persisting,
                    orphaned_key = %stored.key,
                    error = %e,
                    "Stored object has no upload record"
                );
                match e {
                    AppError::UniqueKeyCollision(key) => AppError::UniqueKeyCollision(key),
                    other => AppError::MetadataPersistFailed {
                        key: stored.key.clone(),
                        message: other.to_string(),
                    },
                }
            })?;

        tracing::info!(
            stage = %IngestStage::Done,
            upload_id = %record.id,
            key = %record.remote_key,
            folder = %folder,
            size_bytes = stored.size_bytes,
            "Upload ingested"
        );

        Ok(IngestedUpload {
            record,
            folder,
            size_bytes: stored.size_bytes,
        })
    }

    /// Best-effort removal of an object that must not be kept.
    async fn discard(&self, storage_key: &str) {
        if let Err(e) = self.storage.delete(storage_key).await {
            tracing::warn!(error = %e, key = %storage_key, "Failed to delete oversized object");
        }
    }
}

/// Reject names whose key would exceed what object stores accept.
fn check_file_name(file_name: &str) -> Result<(), AppError> {
    let base = base_name(file_name);
    if base.len() > MAX_FILE_NAME_BYTES {
        return Err(AppError::InvalidInput(format!(
            "File name is too long (max {} bytes)",
            MAX_FILE_NAME_BYTES
        )));
    }
    if extension(base).len() > MAX_EXTENSION_BYTES {
        return Err(AppError::InvalidInput(format!(
            "File extension is too long (max {} bytes)",
            MAX_EXTENSION_BYTES
        )));
    }
    Ok(())
}

fn storage_failure(storage_key: &str, err: StorageError) -> AppError {
    match err {
        StorageError::SourceInterrupted(e) => {
            AppError::InvalidInput(format!("Failed to read file data: {}", e))
        }
        StorageError::AlreadyExists(key) => AppError::UniqueKeyCollision(key),
        other => AppError::StorageWriteFailed {
            key: storage_key.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use cairn_core::{StorageBackend, UploadFolder};
    use cairn_db::MemoryUploadStore;
    use cairn_storage::{ByteStream, MemoryStorage, StorageResult, StoredObject};
    use futures::{stream, StreamExt};
    use std::io;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::task::Poll;

    const BASE_URL: &str = "https://cdn.example.com";

    fn bytes_stream(chunks: &[&'static [u8]]) -> ByteStream<'static> {
        let items: Vec<Result<Bytes, io::Error>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        Box::pin(stream::iter(items))
    }

    fn file(name: &str, content_type: &str, data: ByteStream<'static>) -> IncomingFile<'static> {
        IncomingFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            folder: None,
            data,
        }
    }

    fn pipeline(
        storage: Arc<dyn Storage>,
        uploads: Arc<MemoryUploadStore>,
        max_bytes: u64,
    ) -> UploadPipeline {
        UploadPipeline::new(storage, uploads, FolderPolicy::default(), max_bytes)
    }

    /// Fails the first `n` writes without touching the stream.
    struct FlakyStorage {
        inner: MemoryStorage,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn store_stream<'a>(
            &self,
            storage_key: &str,
            content_type: &str,
            data: ByteStream<'a>,
        ) -> StorageResult<StoredObject> {
            let failed = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(StorageError::UploadFailed("connection reset".to_string()));
            }
            self.inner.store_stream(storage_key, content_type, data).await
        }

        async fn delete(&self, storage_key: &str) -> StorageResult<()> {
            self.inner.delete(storage_key).await
        }

        async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
            self.inner.exists(storage_key).await
        }

        fn public_url(&self, storage_key: &str) -> String {
            self.inner.public_url(storage_key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Memory
        }
    }

    /// Drains the stream, ignores its errors and reports success.
    #[derive(Default)]
    struct LenientStorage {
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl Storage for LenientStorage {
        async fn store_stream<'a>(
            &self,
            storage_key: &str,
            _content_type: &str,
            mut data: ByteStream<'a>,
        ) -> StorageResult<StoredObject> {
            let mut size_bytes = 0u64;
            while let Some(chunk) = data.next().await {
                if let Ok(chunk) = chunk {
                    size_bytes += chunk.len() as u64;
                }
            }
            Ok(StoredObject {
                key: storage_key.to_string(),
                url: self.public_url(storage_key),
                size_bytes,
            })
        }

        async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        fn public_url(&self, storage_key: &str) -> String {
            format!("{}/{}", BASE_URL, storage_key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Memory
        }
    }

    #[tokio::test]
    async fn test_ingest_stores_bytes_then_record() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let ingested = pipeline
            .ingest(file(
                "holiday photo.png",
                "image/png",
                bytes_stream(&[b"\x89PNG", b"rest"]),
            ))
            .await
            .unwrap();

        assert_eq!(ingested.folder, UploadFolder::Images);
        assert!(ingested.key().starts_with("images/"));
        assert!(ingested.key().ends_with("-holidayphotopng.png"));
        assert_eq!(ingested.url(), format!("{}/{}", BASE_URL, ingested.key()));
        assert_eq!(ingested.size_bytes, 8);

        let stored = storage.read(ingested.key()).await.unwrap().unwrap();
        assert_eq!(stored, b"\x89PNGrest");

        let records = uploads.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "holiday photo.png");
        assert_eq!(records[0].remote_key, ingested.key());
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected_before_reading() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let data: ByteStream<'static> = Box::pin(stream::poll_fn(move |_| {
            flag.store(true, Ordering::SeqCst);
            Poll::Ready(None::<Result<Bytes, io::Error>>)
        }));

        let err = pipeline
            .ingest(file("page.html", "text/html", data))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidFileFormat(_)));
        assert!(!polled.load(Ordering::SeqCst));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_folder_must_accept_type() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage, uploads, 1024);

        let mut incoming = file("a.png", "image/png", bytes_stream(&[b"png"]));
        incoming.folder = Some(UploadFolder::Downloads);
        let err = pipeline.ingest(incoming).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFileFormat(_)));

        let mut incoming = file("report.pdf", "application/pdf", bytes_stream(&[b"%PDF"]));
        incoming.folder = Some(UploadFolder::Downloads);
        let ingested = pipeline.ingest(incoming).await.unwrap();
        assert!(ingested.key().starts_with("downloads/"));
    }

    #[tokio::test]
    async fn test_oversized_upload_leaves_nothing_behind() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 8);

        let err = pipeline
            .ingest(file("big.jpg", "image/jpeg", bytes_stream(&[b"12345", b"67890"])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FileTooLarge { max_bytes: 8 }));
        assert!(uploads.records().is_empty());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exactly_at_limit_is_accepted() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage, uploads.clone(), 8);

        pipeline
            .ingest(file("ok.gif", "image/gif", bytes_stream(&[b"1234", b"5678"])))
            .await
            .unwrap();
        assert_eq!(uploads.records().len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_success_is_deleted() {
        let storage = Arc::new(LenientStorage::default());
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 4);

        let err = pipeline
            .ingest(file("big.png", "image/png", bytes_stream(&[b"123", b"456"])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FileTooLarge { .. }));
        assert_eq!(storage.deletes.load(Ordering::SeqCst), 1);
        assert!(uploads.records().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_storage_failure_creates_one_record() {
        let storage = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(BASE_URL),
            failures_left: AtomicUsize::new(1),
        });
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let err = pipeline
            .ingest(file("cat.webp", "image/webp", bytes_stream(&[b"meow"])))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StorageWriteFailed { .. }));
        assert!(uploads.records().is_empty());

        let ingested = pipeline
            .ingest(file("cat.webp", "image/webp", bytes_stream(&[b"meow"])))
            .await
            .unwrap();

        let records = uploads.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].remote_key, ingested.key());
        assert_eq!(storage.inner.keys().await.unwrap(), vec![ingested.key().to_string()]);
    }

    #[tokio::test]
    async fn test_metadata_failure_reports_and_keeps_object() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        uploads.fail_next_inserts(1);
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let err = pipeline
            .ingest(file("notes.txt", "text/plain", bytes_stream(&[b"hello"])))
            .await
            .unwrap_err();

        let key = match err {
            AppError::MetadataPersistFailed { key, .. } => key,
            other => panic!("expected MetadataPersistFailed, got {other:?}"),
        };
        assert!(key.starts_with("downloads/"));
        assert_eq!(storage.keys().await.unwrap(), vec![key]);
        assert!(uploads.records().is_empty());
    }

    #[tokio::test]
    async fn test_client_stream_failure_is_caller_error() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let data: ByteStream<'static> = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"part")),
            Err(io::Error::other("client disconnected")),
        ]));
        let err = pipeline
            .ingest(file("a.zip", "application/zip", data))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(uploads.records().is_empty());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_key_matches_stored_location() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let ingested = pipeline
            .ingest(file("photo.p%n~g", "image/png", bytes_stream(&[b"png"])))
            .await
            .unwrap();

        let records = uploads.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            storage.keys().await.unwrap(),
            vec![records[0].remote_key.clone()]
        );
        assert!(records[0].remote_key.ends_with("-photopng.p%25n%7Eg"));
        assert_eq!(records[0].remote_url, storage.public_url(ingested.key()));
        assert!(records[0].remote_url.ends_with("-photopng.p%2525n%257Eg"));
        assert_eq!(
            storage.read(ingested.key()).await.unwrap(),
            Some(b"png".to_vec())
        );
    }

    #[tokio::test]
    async fn test_overlong_names_rejected_before_reading() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage.clone(), uploads.clone(), 1024);

        let long_base = format!("{}.png", "a".repeat(MAX_FILE_NAME_BYTES));
        let long_ext = format!("a.{}", "p".repeat(2000));
        for name in [long_base, long_ext] {
            let polled = Arc::new(AtomicBool::new(false));
            let flag = polled.clone();
            let data: ByteStream<'static> = Box::pin(stream::poll_fn(move |_| {
                flag.store(true, Ordering::SeqCst);
                Poll::Ready(None::<Result<Bytes, io::Error>>)
            }));

            let err = pipeline
                .ingest(file(&name, "image/png", data))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{name}: {err:?}");
            assert!(!polled.load(Ordering::SeqCst));
        }
        assert!(storage.keys().await.unwrap().is_empty());
        assert!(uploads.records().is_empty());
    }

    #[tokio::test]
    async fn test_name_length_counts_only_the_base_name() {
        let storage = Arc::new(MemoryStorage::new(BASE_URL));
        let uploads = Arc::new(MemoryUploadStore::new());
        let pipeline = pipeline(storage, uploads.clone(), 1024);

        let dirs = "d/".repeat(200);
        let name = format!("{}{}.png", dirs, "b".repeat(MAX_FILE_NAME_BYTES - 4));
        pipeline
            .ingest(file(&name, "image/png", bytes_stream(&[b"png"])))
            .await
            .unwrap();
        assert_eq!(uploads.records().len(), 1);
    }
}
