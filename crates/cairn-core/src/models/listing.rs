use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::error::AppError;
use crate::models::upload::UploadRecord;

/// Fields a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortField {
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortField {
    /// Column backing this field.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            other => Err(AppError::InvalidSortField(format!(
                "Cannot sort by '{}'. Supported fields: createdAt",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::InvalidInput(format!(
                "Validation Error: sortDirection must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

/// Ordering applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadSort {
    /// Newest first by id.
    #[default]
    Default,
    /// Named field in the given direction, with id as tiebreak in the same
    /// direction.
    By {
        field: SortField,
        direction: SortDirection,
    },
}

impl UploadSort {
    /// Both parts are required for an explicit sort; missing either falls
    /// back to the default order.
    pub fn from_parts(field: Option<SortField>, direction: Option<SortDirection>) -> Self {
        match (field, direction) {
            (Some(field), Some(direction)) => UploadSort::By { field, direction },
            _ => UploadSort::Default,
        }
    }

    /// SQL `ORDER BY` body. Only static column names are ever produced.
    pub fn order_by_clause(&self) -> String {
        match self {
            UploadSort::Default => "id DESC".to_string(),
            UploadSort::By { field, direction } => format!(
                "{} {}, id {}",
                field.column(),
                direction.as_sql(),
                direction.as_sql()
            ),
        }
    }
}

/// Case-insensitive substring filter on `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadFilter {
    pub search_query: Option<String>,
}

impl UploadFilter {
    /// Blank terms mean no filter.
    pub fn new(search_query: Option<String>) -> Self {
        Self {
            search_query: search_query.filter(|q| !q.is_empty()),
        }
    }

    /// `ILIKE` pattern matching the term anywhere. LIKE metacharacters in the
    /// term are escaped so they match literally.
    pub fn name_pattern(&self) -> Option<String> {
        self.search_query.as_ref().map(|q| {
            let mut escaped = String::with_capacity(q.len() + 2);
            for c in q.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            format!("%{}%", escaped)
        })
    }

    /// In-process equivalent of the `ILIKE` predicate.
    pub fn matches(&self, name: &str) -> bool {
        match &self.search_query {
            Some(q) => name.to_lowercase().contains(&q.to_lowercase()),
            None => true,
        }
    }
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1, message = "page must be a positive integer"))]
    pub page: u32,
    #[validate(range(min = 1, message = "pageSize must be a positive integer"))]
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, AppError> {
        let request = Self { page, page_size };
        request.validate()?;
        Ok(request)
    }

    /// Rows to skip. Saturates, so a page far past the end is just empty.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).saturating_mul(i64::from(self.page_size))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// Fully validated listing input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingParams {
    pub filter: UploadFilter,
    pub sort: UploadSort,
    pub page: PageRequest,
}

impl ListingParams {
    /// Validate raw query values. `sortBy` is checked even when
    /// `sortDirection` is absent.
    pub fn parse(
        search_query: Option<String>,
        sort_by: Option<&str>,
        sort_direction: Option<&str>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Self, AppError> {
        let field = sort_by.map(SortField::from_str).transpose()?;
        let direction = sort_direction.map(SortDirection::from_str).transpose()?;
        let page = PageRequest::new(
            page.unwrap_or(DEFAULT_PAGE),
            page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )?;

        Ok(Self {
            filter: UploadFilter::new(search_query),
            sort: UploadSort::from_parts(field, direction),
            page,
        })
    }
}

/// One page of records plus the filter's total match count.
///
/// The count runs as a separate query, so under concurrent inserts it can
/// disagree with the page by the number of writes in between.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadPage {
    pub uploads: Vec<UploadRecord>,
    pub total: i64,
}
