use std::io;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use cairn_core::{AppError, UploadFolder};
use cairn_storage::ByteStream;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, HttpAppError, ValidatedQuery};
use crate::services::upload::IncomingFile;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Target folder: `images` or `downloads`. Inferred from the file's
    /// content type when omitted.
    #[param(example = "images")]
    pub folder: Option<String>,
}

impl UploadQuery {
    fn folder(&self) -> Result<Option<UploadFolder>, AppError> {
        self.folder
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::parse)
            .transpose()
    }
}

/// Multipart body: one file part. Other fields are ignored.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored file
    pub url: String,
}

/// Upload a file
///
/// Streams the first file part of the multipart body to storage and records
/// it. The response is sent only after the record is persisted.
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "uploads",
    params(UploadQuery),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "Invalid folder, unsupported type, file too large or missing file", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query, multipart), fields(folder = ?query.folder, operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<UploadQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let folder = query.folder()?;
    let mut multipart = multipart.map_err(|e| {
        AppError::InvalidInput(format!("Invalid multipart request: {}", e.body_text()))
    })?;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::InvalidInput(format!("Failed to read multipart field: {}", e.body_text()))
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::debug!(field = ?field.name(), "Skipping non-file multipart field");
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data: ByteStream<'_> = Box::pin(field.map_err(io::Error::other));

        let ingested = state
            .pipeline
            .ingest(IncomingFile {
                file_name,
                content_type,
                folder,
                data,
            })
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: ingested.record.remote_url,
            }),
        ));
    }

    Err(AppError::InvalidInput("File is required".to_string()).into())
}
