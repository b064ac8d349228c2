//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use cairn_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Runs [`Config::validate`] and adds checks that only matter for a served
/// process.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.storage_backend == StorageBackend::Memory {
        return Err(anyhow::anyhow!(
            "STORAGE_BACKEND=memory loses every upload on restart and cannot be used in production"
        ));
    }

    if config.base.db_timeout_seconds == 0 {
        return Err(anyhow::anyhow!("DB_TIMEOUT_SECONDS must be greater than 0"));
    }

    if config.base.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
    }

    if config.folder_policy.accepted_types(cairn_core::UploadFolder::Images).is_empty()
        && config
            .folder_policy
            .accepted_types(cairn_core::UploadFolder::Downloads)
            .is_empty()
    {
        return Err(anyhow::anyhow!(
            "IMAGES_ALLOWED_CONTENT_TYPES and DOWNLOADS_ALLOWED_CONTENT_TYPES are both empty; no upload could be accepted"
        ));
    }

    Ok(())
}
