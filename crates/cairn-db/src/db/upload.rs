use async_trait::async_trait;
use cairn_core::{AppError, NewUpload, PageRequest, UploadFilter, UploadRecord, UploadSort};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistence for upload records.
///
/// `remote_key` is unique: inserting a key that already exists fails with
/// `UniqueKeyCollision` and leaves the existing row untouched.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Insert a record. The store assigns `id` (UUIDv7) and `created_at`.
    async fn insert(&self, upload: NewUpload) -> Result<UploadRecord, AppError>;

    /// One page of records matching `filter` in `sort` order.
    async fn list(
        &self,
        filter: &UploadFilter,
        sort: UploadSort,
        page: PageRequest,
    ) -> Result<Vec<UploadRecord>, AppError>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &UploadFilter) -> Result<i64, AppError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Postgres-backed upload repository
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error, remote_key: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::UniqueKeyCollision(remote_key.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl UploadStore for UploadRepository {
    #[tracing::instrument(skip(self, upload), fields(db.table = "uploads", db.operation = "insert", remote_key = %upload.remote_key))]
    async fn insert(&self, upload: NewUpload) -> Result<UploadRecord, AppError> {
        let record = sqlx::query_as::<Postgres, UploadRecord>(
            r#"
            INSERT INTO uploads (id, name, remote_key, remote_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, remote_key, remote_url, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&upload.name)
        .bind(&upload.remote_key)
        .bind(&upload.remote_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &upload.remote_key))?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "select"))]
    async fn list(
        &self,
        filter: &UploadFilter,
        sort: UploadSort,
        page: PageRequest,
    ) -> Result<Vec<UploadRecord>, AppError> {
        let mut sql = String::from(
            r#"
            SELECT id, name, remote_key, remote_url, created_at
            FROM uploads
            WHERE 1=1
            "#,
        );

        let mut param_count = 1;
        let pattern = filter.name_pattern();

        if pattern.is_some() {
            sql.push_str(&format!(" AND name ILIKE ${}", param_count));
            param_count += 1;
        }

        sql.push_str(&format!(" ORDER BY {}", sort.order_by_clause()));

        sql.push_str(&format!(" LIMIT ${}", param_count));
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${}", param_count));

        let mut query_builder = sqlx::query_as::<Postgres, UploadRecord>(&sql);

        if let Some(pattern) = pattern {
            query_builder = query_builder.bind(pattern);
        }

        query_builder = query_builder.bind(page.limit());
        query_builder = query_builder.bind(page.offset());

        query_builder
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "count"))]
    async fn count(&self, filter: &UploadFilter) -> Result<i64, AppError> {
        let count = match filter.name_pattern() {
            Some(pattern) => {
                sqlx::query_scalar::<Postgres, i64>(
                    "SELECT COUNT(*) FROM uploads WHERE name ILIKE $1",
                )
                .bind(pattern)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM uploads")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
