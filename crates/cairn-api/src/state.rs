//! Application state shared by every handler.

use crate::services::listing::ListingQuery;
use crate::services::upload::UploadPipeline;
use cairn_core::FolderPolicy;
use cairn_db::UploadStore;
use cairn_storage::Storage;
use std::sync::Arc;

/// Upload limits the HTTP edge needs before the pipeline runs.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_file_size_bytes: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub upload: UploadConfig,
    pub pipeline: UploadPipeline,
    pub listing: ListingQuery,
    pub storage: Arc<dyn Storage>,
    pub uploads: Arc<dyn UploadStore>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        uploads: Arc<dyn UploadStore>,
        folder_policy: FolderPolicy,
        max_file_size_bytes: u64,
    ) -> Self {
        Self {
            upload: UploadConfig {
                max_file_size_bytes,
            },
            pipeline: UploadPipeline::new(
                storage.clone(),
                uploads.clone(),
                folder_policy,
                max_file_size_bytes,
            ),
            listing: ListingQuery::new(uploads.clone()),
            storage,
            uploads,
        }
    }
}
