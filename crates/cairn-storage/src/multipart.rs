//! Streamed multipart writes shared by every `object_store` backend.

use crate::traits::{ByteStream, StorageError, StorageResult};
use futures::StreamExt;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, Attributes, ObjectStore, ObjectStoreExt, WriteMultipart};

/// Parts allowed in flight before the writer stops pulling from the source.
const MAX_IN_FLIGHT_PARTS: usize = 2;

/// Attributes carrying the declared content type.
pub(crate) fn content_type_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    if !content_type.is_empty() {
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
    }
    attributes
}

/// Multipart writer that aborts itself if dropped before `finish`.
///
/// A request future cancelled mid-upload (client disconnect) drops this
/// guard, and the abort runs on a spawned task.
struct AbortOnDrop {
    writer: Option<WriteMultipart>,
    key: String,
}

impl AbortOnDrop {
    fn new(writer: WriteMultipart, key: &str) -> Self {
        Self {
            writer: Some(writer),
            key: key.to_string(),
        }
    }

    fn writer(&mut self) -> StorageResult<&mut WriteMultipart> {
        self.writer
            .as_mut()
            .ok_or_else(|| StorageError::BackendError("multipart writer already closed".into()))
    }

    async fn finish(mut self) -> Result<(), ObjectStoreError> {
        match self.writer.take() {
            Some(writer) => writer.finish().await.map(|_| ()),
            None => Ok(()),
        }
    }

    async fn abort(mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.abort().await {
                tracing::warn!(error = %e, key = %self.key, "Failed to abort multipart upload");
            }
        }
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = writer.abort().await {
                        tracing::warn!(error = %e, key = %key, "Failed to abort cancelled multipart upload");
                    } else {
                        tracing::debug!(key = %key, "Aborted cancelled multipart upload");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(key = %key, "No runtime to abort cancelled multipart upload");
            }
        }
    }
}

/// Where a freshly derived key is written. Characters object stores reject
/// (`%`, `~`, `#`, ...) are percent-encoded, so the location's string form is
/// the key the object really lives under.
pub(crate) fn write_location(storage_key: &str) -> Path {
    Path::from(storage_key)
}

/// Location of a key previously returned in `StoredObject::key`. Taken as-is,
/// without a second round of encoding.
pub(crate) fn stored_location(storage_key: &str) -> StorageResult<Path> {
    Path::parse(storage_key).map_err(|e| StorageError::InvalidKey(e.to_string()))
}

/// Fail with `AlreadyExists` if an object is already stored at `location`.
pub(crate) async fn ensure_absent<S>(store: &S, location: &Path) -> StorageResult<()>
where
    S: ObjectStore,
{
    match store.head(location).await {
        Ok(_) => Err(StorageError::AlreadyExists(location.to_string())),
        Err(ObjectStoreError::NotFound { .. }) => Ok(()),
        Err(e) => Err(StorageError::BackendError(e.to_string())),
    }
}

/// Stream `data` into a new object at `location`. Returns the number of
/// bytes written.
///
/// Chunks are pulled only while the writer has capacity, so a slow backend
/// slows the reader down. Any failure aborts the multipart upload.
pub(crate) async fn put_stream<S>(
    store: &S,
    location: &Path,
    attributes: Attributes,
    mut data: ByteStream<'_>,
) -> StorageResult<u64>
where
    S: ObjectStore,
{
    ensure_absent(store, location).await?;

    let upload = store
        .put_multipart_opts(location, attributes.into())
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

    let mut guard = AbortOnDrop::new(WriteMultipart::new(upload), location.as_ref());
    let mut size_bytes: u64 = 0;

    while let Some(chunk) = data.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                guard.abort().await;
                return Err(StorageError::SourceInterrupted(e));
            }
        };

        let writer = guard.writer()?;
        if let Err(e) = writer.wait_for_capacity(MAX_IN_FLIGHT_PARTS).await {
            guard.abort().await;
            return Err(StorageError::UploadFailed(e.to_string()));
        }
        writer.write(&chunk);
        size_bytes += chunk.len() as u64;
    }

    guard
        .finish()
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

    Ok(size_bytes)
}
