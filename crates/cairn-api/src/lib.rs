//! Cairn API library
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! build the same router on top of in-memory storage and records.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
