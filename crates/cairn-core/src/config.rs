//! Configuration module
//!
//! Configuration is read once from the environment at startup and validated
//! before any server resource is created.

use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_DOWNLOAD_CONTENT_TYPES, DEFAULT_IMAGE_CONTENT_TYPES, DEFAULT_MAX_FILE_SIZE_BYTES,
};
use crate::models::FolderPolicy;
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 3333;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 256;

/// Server-level settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub log_format: String,
    pub http_concurrency_limit: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub public_base_url: String,
    // Upload configuration
    pub max_file_size_bytes: u64,
    pub folder_policy: FolderPolicy,
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = non_empty(lookup("DATABASE_URL"))
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let public_base_url = non_empty(lookup("PUBLIC_BASE_URL"))
            .ok_or_else(|| anyhow::anyhow!("PUBLIC_BASE_URL must be set"))?;

        let storage_backend = match non_empty(lookup("STORAGE_BACKEND")) {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = non_empty(lookup("ENVIRONMENT"))
            .or_else(|| non_empty(lookup("APP_ENV")))
            .unwrap_or_else(|| "development".to_string());

        let folder_policy = FolderPolicy::from_lists(
            &lookup("IMAGES_ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPES.to_string()),
            &lookup("DOWNLOADS_ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_CONTENT_TYPES.to_string()),
        );

        Ok(Config {
            base: BaseConfig {
                server_port: parse_or(lookup("PORT"), DEFAULT_PORT),
                cors_origins,
                db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
                db_timeout_seconds: parse_or(
                    lookup("DB_TIMEOUT_SECONDS"),
                    CONNECTION_TIMEOUT_SECS,
                ),
                environment,
                log_format: lookup("LOG_FORMAT")
                    .unwrap_or_else(|| "text".to_string())
                    .to_lowercase(),
                http_concurrency_limit: parse_or(
                    lookup("HTTP_CONCURRENCY_LIMIT"),
                    HTTP_CONCURRENCY_LIMIT,
                ),
            },
            database_url,
            storage_backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: non_empty(lookup("S3_REGION")),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            aws_region: non_empty(lookup("AWS_REGION")),
            local_storage_path: non_empty(lookup("LOCAL_STORAGE_PATH")),
            public_base_url,
            max_file_size_bytes: parse_or(
                lookup("MAX_FILE_SIZE_BYTES"),
                DEFAULT_MAX_FILE_SIZE_BYTES,
            ),
            folder_policy,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if !self.public_base_url.starts_with("http://")
            && !self.public_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "PUBLIC_BASE_URL must be an absolute http(s) URL"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than 0"));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS must list explicit origins in production"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    /// Region for S3, preferring `S3_REGION` over `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.base.log_format == "json"
    }
}
