use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::{DEFAULT_DOWNLOAD_CONTENT_TYPES, DEFAULT_IMAGE_CONTENT_TYPES};
use crate::error::AppError;

/// Logical category scoping storage keys and the content types they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadFolder {
    Images,
    Downloads,
}

impl UploadFolder {
    pub const ALL: [UploadFolder; 2] = [UploadFolder::Images, UploadFolder::Downloads];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::Images => "images",
            UploadFolder::Downloads => "downloads",
        }
    }
}

impl fmt::Display for UploadFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadFolder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(UploadFolder::Images),
            "downloads" => Ok(UploadFolder::Downloads),
            other => Err(AppError::InvalidFolder(format!(
                "Unknown folder '{}'. Expected one of: images, downloads",
                other
            ))),
        }
    }
}

/// Strip MIME parameters and lowercase, so `Image/PNG; charset=x` becomes
/// `image/png`.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn parse_type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_content_type)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Accepted content types per folder.
///
/// Folders are checked in [`UploadFolder::ALL`] order when the caller does not
/// name one, so a type listed under both folders resolves to `images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPolicy {
    images: Vec<String>,
    downloads: Vec<String>,
}

impl Default for FolderPolicy {
    fn default() -> Self {
        Self::from_lists(DEFAULT_IMAGE_CONTENT_TYPES, DEFAULT_DOWNLOAD_CONTENT_TYPES)
    }
}

impl FolderPolicy {
    pub fn new(images: Vec<String>, downloads: Vec<String>) -> Self {
        Self {
            images: images.iter().map(|t| normalize_content_type(t)).collect(),
            downloads: downloads.iter().map(|t| normalize_content_type(t)).collect(),
        }
    }

    /// Build from comma-separated lists as found in the environment.
    pub fn from_lists(images: &str, downloads: &str) -> Self {
        Self {
            images: parse_type_list(images),
            downloads: parse_type_list(downloads),
        }
    }

    pub fn accepted_types(&self, folder: UploadFolder) -> &[String] {
        match folder {
            UploadFolder::Images => &self.images,
            UploadFolder::Downloads => &self.downloads,
        }
    }

    pub fn accepts(&self, folder: UploadFolder, content_type: &str) -> bool {
        let normalized = normalize_content_type(content_type);
        self.accepted_types(folder).iter().any(|t| *t == normalized)
    }

    /// Pick the folder for an upload.
    ///
    /// An explicit folder must accept the content type. Without one, the first
    /// folder accepting it wins. Either way a type nobody accepts is
    /// `InvalidFileFormat`.
    pub fn resolve(
        &self,
        requested: Option<UploadFolder>,
        content_type: &str,
    ) -> Result<UploadFolder, AppError> {
        let normalized = normalize_content_type(content_type);
        if normalized.is_empty() {
            return Err(AppError::InvalidFileFormat(
                "File content type is missing".to_string(),
            ));
        }

        match requested {
            Some(folder) if self.accepts(folder, &normalized) => Ok(folder),
            Some(folder) => Err(AppError::InvalidFileFormat(format!(
                "Content type '{}' is not accepted in folder '{}'. Allowed: {}",
                normalized,
                folder,
                self.accepted_types(folder).join(", ")
            ))),
            None => UploadFolder::ALL
                .into_iter()
                .find(|folder| self.accepts(*folder, &normalized))
                .ok_or_else(|| {
                    AppError::InvalidFileFormat(format!(
                        "Content type '{}' is not accepted",
                        normalized
                    ))
                }),
        }
    }
}
