//! Shared defaults.

/// Default per-upload byte ceiling (2 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;

/// Longest client file name accepted, in bytes, directories excluded.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Longest extension kept in a storage key, in bytes, dot included.
pub const MAX_EXTENSION_BYTES: usize = 32;

/// Page number used when the client omits `page`.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the client omits `pageSize`.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Content types accepted for the `images` folder unless overridden.
pub const DEFAULT_IMAGE_CONTENT_TYPES: &str = "image/jpeg,image/jpg,image/png,image/webp,image/gif";

/// Content types accepted for the `downloads` folder unless overridden.
pub const DEFAULT_DOWNLOAD_CONTENT_TYPES: &str = "application/pdf,application/zip,text/plain,text/csv";
