//! Paginated reads over upload records.

use std::sync::Arc;

use cairn_core::{AppError, ListingParams, UploadPage};
use cairn_db::UploadStore;

/// Runs the page query and the count query for one listing request.
///
/// The two reads run concurrently and share no snapshot, so `total` can be
/// off by the number of inserts that land between them.
#[derive(Clone)]
pub struct ListingQuery {
    uploads: Arc<dyn UploadStore>,
}

impl ListingQuery {
    pub fn new(uploads: Arc<dyn UploadStore>) -> Self {
        Self { uploads }
    }

    #[tracing::instrument(skip(self), fields(page = params.page.page, page_size = params.page.page_size))]
    pub async fn list(&self, params: &ListingParams) -> Result<UploadPage, AppError> {
        let (uploads, total) = tokio::try_join!(
            self.uploads.list(&params.filter, params.sort, params.page),
            self.uploads.count(&params.filter),
        )?;

        tracing::debug!(returned = uploads.len(), total, "Listed uploads");

        Ok(UploadPage { uploads, total })
    }
}
