pub mod folder;
pub mod listing;
pub mod upload;

pub use folder::{normalize_content_type, FolderPolicy, UploadFolder};
pub use listing::{
    ListingParams, PageRequest, SortDirection, SortField, UploadFilter, UploadPage, UploadSort,
};
pub use upload::{NewUpload, UploadRecord};
