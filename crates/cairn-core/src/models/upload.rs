use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One successfully stored file.
///
/// Records are written once after the bytes are durably stored and never
/// updated. `id` is a UUIDv7, so ordering by id follows creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: Uuid,
    /// Client-supplied filename, stored as received.
    pub name: String,
    pub remote_key: String,
    pub remote_url: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an upload record. `id` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUpload {
    pub name: String,
    pub remote_key: String,
    pub remote_url: String,
}

impl NewUpload {
    pub fn new(
        name: impl Into<String>,
        remote_key: impl Into<String>,
        remote_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            remote_key: remote_key.into(),
            remote_url: remote_url.into(),
        }
    }
}
