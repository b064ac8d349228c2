//! HTTP-edge constants

/// Allowance on top of the file ceiling for multipart boundaries, part
/// headers and non-file fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Upper bound for each dependency probe in the readiness check.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Path the OpenAPI document is served from.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Path of the interactive API reference.
pub const API_DOCS_UI_PATH: &str = "/docs";
