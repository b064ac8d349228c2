use std::sync::Arc;

use axum::{extract::State, Json};
use cairn_core::{ListingParams, UploadPage};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError, ValidatedQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUploadsQuery {
    /// Case-insensitive substring matched against the file name
    pub search_query: Option<String>,
    /// Only `createdAt` is supported; ignored unless `sortDirection` is also set
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_direction: Option<String>,
    /// 1-based page number (default 1)
    #[param(minimum = 1)]
    pub page: Option<u32>,
    /// Records per page (default 20)
    #[param(minimum = 1)]
    pub page_size: Option<u32>,
}

impl ListUploadsQuery {
    fn into_listing_params(self) -> Result<ListingParams, cairn_core::AppError> {
        ListingParams::parse(
            self.search_query,
            self.sort_by.as_deref(),
            self.sort_direction.as_deref(),
            self.page,
            self.page_size,
        )
    }
}

/// List uploads
///
/// Without both `sortBy` and `sortDirection` the newest uploads come first.
/// `total` counts every record matching `searchQuery`.
#[utoipa::path(
    get,
    path = "/uploads",
    tag = "uploads",
    params(ListUploadsQuery),
    responses(
        (status = 200, description = "One page of uploads", body = UploadPage),
        (status = 400, description = "Invalid sort field or paging", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_uploads"))]
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListUploadsQuery>,
) -> Result<Json<UploadPage>, HttpAppError> {
    let params = query.into_listing_params()?;
    let page = state.listing.list(&params).await?;
    Ok(Json(page))
}
