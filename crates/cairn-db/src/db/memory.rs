use crate::db::upload::UploadStore;
use async_trait::async_trait;
use cairn_core::{
    AppError, NewUpload, PageRequest, SortDirection, UploadFilter, UploadRecord, UploadSort,
};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// `UploadStore` over a `Vec`, with the same uniqueness and ordering rules as
/// the Postgres repository. Inserts can be made to fail on demand.
#[derive(Default)]
pub struct MemoryUploadStore {
    records: Mutex<Vec<UploadRecord>>,
    failing_inserts: AtomicUsize,
}

impl MemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` inserts fail with a database error.
    pub fn fail_next_inserts(&self, n: usize) {
        self.failing_inserts.store(n, Ordering::SeqCst);
    }

    /// Snapshot of every stored record in insertion order.
    pub fn records(&self) -> Vec<UploadRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UploadRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> bool {
        self.failing_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl UploadStore for MemoryUploadStore {
    async fn insert(&self, upload: NewUpload) -> Result<UploadRecord, AppError> {
        if self.take_failure() {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut records = self.lock();
        if records.iter().any(|r| r.remote_key == upload.remote_key) {
            return Err(AppError::UniqueKeyCollision(upload.remote_key));
        }

        let record = UploadRecord {
            id: Uuid::now_v7(),
            name: upload.name,
            remote_key: upload.remote_key,
            remote_url: upload.remote_url,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        filter: &UploadFilter,
        sort: UploadSort,
        page: PageRequest,
    ) -> Result<Vec<UploadRecord>, AppError> {
        let mut matching: Vec<UploadRecord> = self
            .lock()
            .iter()
            .filter(|r| filter.matches(&r.name))
            .cloned()
            .collect();

        match sort {
            UploadSort::Default => matching.sort_by(|a, b| b.id.cmp(&a.id)),
            UploadSort::By { direction, .. } => {
                matching.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
                if direction == SortDirection::Desc {
                    matching.reverse();
                }
            }
        }

        Ok(matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, filter: &UploadFilter) -> Result<i64, AppError> {
        Ok(self.lock().iter().filter(|r| filter.matches(&r.name)).count() as i64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
