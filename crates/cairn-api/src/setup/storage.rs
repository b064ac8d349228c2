//! Storage setup and initialization

use anyhow::Result;
use cairn_core::{Config, StorageBackend};
use cairn_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the configured storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config).await?;
    let backend_type = storage.backend_type();

    if backend_type == StorageBackend::S3 {
        tracing::info!(
            backend = %backend_type,
            bucket = ?config.s3_bucket,
            region = ?config.s3_region(),
            endpoint = ?config.s3_endpoint,
            "Storage initialized successfully"
        );
    } else {
        tracing::info!(backend = %backend_type, "Storage initialized successfully");
    }

    Ok(storage)
}
