//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use cairn_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cairn API",
        version = "0.1.0",
        description = "File upload ingestion and listing. Files are streamed to object storage under a folder-scoped key and recorded for paginated, searchable listing."
    ),
    paths(
        handlers::upload::upload_file,
        handlers::list::list_uploads
    ),
    components(
        schemas(
            models::UploadRecord,
            models::UploadPage,
            models::UploadFolder,
            models::SortField,
            models::SortDirection,
            handlers::upload::UploadForm,
            handlers::upload::UploadResponse,
            error::ErrorResponse
        )
    ),
    tags(
        (name = "uploads", description = "File upload and listing operations")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document served at `/api-docs/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
