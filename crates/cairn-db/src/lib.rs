//! Cairn Database Library
//!
//! Upload metadata persistence. [`UploadStore`] is the seam the pipeline and
//! listing depend on; [`UploadRepository`] is the Postgres implementation.

pub mod db;

pub use db::upload::{UploadRepository, UploadStore};
#[cfg(any(test, feature = "test-utils"))]
pub use db::memory::MemoryUploadStore;

/// Embedded schema migrations from the workspace `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
