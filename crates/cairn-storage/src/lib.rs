//! Cairn Storage Library
//!
//! Streaming object storage behind the [`Storage`] trait, with S3, local
//! filesystem and in-memory backends built on `object_store`.
//!
//! # Storage key format
//!
//! Keys are folder-scoped: `{folder}/{token}-{sanitized}{ext}`. Key derivation
//! lives in [`keys`] so every backend sees the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
mod multipart;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod url;

// Re-export commonly used types
pub use cairn_core::StorageBackend;
pub use factory::create_storage;
pub use keys::derive_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
