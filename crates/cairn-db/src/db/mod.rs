//! Database repositories for the data access layer
//
// Postgres upload repository and the store trait
pub mod upload;
//
// In-process store for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
