//! Configuration module
//!
//! Server, storage and media-pipeline settings, loaded from the environment (and `.env`).

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_MAX_THUMBNAIL_SIZE_BYTES, DEFAULT_MAX_VIDEO_SIZE_BYTES, DEFAULT_PRESIGN_EXPIRY_SECS,
    VIDEO_MP4,
};
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 5;
const PROBE_TIMEOUT_SECS: u64 = 30;
const REMUX_TIMEOUT_SECS: u64 = 300;
const UPLOAD_TIMEOUT_SECS: u64 = 600;
const THUMBNAIL_CACHE_CAPACITY: usize = 1024;

/// Settings shared by every service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub database_url: String,
    pub db_max_connections: u32,
}

/// Object store configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    /// HMAC key for local presigned URLs.
    pub local_storage_signing_key: String,
    pub presign_expiry_secs: u64,
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Directory that holds every temporary upload artifact.
    pub temp_root: PathBuf,
    pub max_video_size_bytes: u64,
    pub video_content_type: String,
    pub max_thumbnail_size_bytes: u64,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub probe_timeout_secs: u64,
    pub remux_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    /// Compare the stored object size with the local file before deleting local copies.
    pub verify_uploads: bool,
    pub thumbnail_cache_capacity: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
}

/// Parse `value` when set, else `default`. A malformed value is an error.
fn parse_or<T: FromStr>(
    key: &str,
    value: Option<String>,
    default: T,
) -> Result<T, anyhow::Error> {
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, v)),
        None => Ok(default),
    }
}

fn parse_bool_or(value: Option<String>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an explicit variable map (used by tests).
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        Self::from_vars(|key| vars.get(key).cloned())
    }

    fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?;

        let base = BaseConfig {
            server_port: match var("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            cors_origins,
            environment,
            jwt_secret: jwt_secret.clone(),
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://tubely.db".to_string()),
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                var("DB_MAX_CONNECTIONS"),
                MAX_CONNECTIONS,
            )?,
        };

        let backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            local_storage_signing_key: var("LOCAL_STORAGE_SIGNING_KEY").unwrap_or(jwt_secret),
            presign_expiry_secs: parse_or(
                "PRESIGN_EXPIRY_SECS",
                var("PRESIGN_EXPIRY_SECS"),
                DEFAULT_PRESIGN_EXPIRY_SECS,
            )?,
        };

        let media = MediaConfig {
            temp_root: var("TEMP_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("tubely")),
            max_video_size_bytes: parse_or(
                "MAX_VIDEO_SIZE_BYTES",
                var("MAX_VIDEO_SIZE_BYTES"),
                DEFAULT_MAX_VIDEO_SIZE_BYTES,
            )?,
            video_content_type: var("VIDEO_CONTENT_TYPE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|| VIDEO_MP4.to_string()),
            max_thumbnail_size_bytes: parse_or(
                "MAX_THUMBNAIL_SIZE_BYTES",
                var("MAX_THUMBNAIL_SIZE_BYTES"),
                DEFAULT_MAX_THUMBNAIL_SIZE_BYTES,
            )?,
            ffprobe_path: var("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            probe_timeout_secs: parse_or(
                "PROBE_TIMEOUT_SECS",
                var("PROBE_TIMEOUT_SECS"),
                PROBE_TIMEOUT_SECS,
            )?,
            remux_timeout_secs: parse_or(
                "REMUX_TIMEOUT_SECS",
                var("REMUX_TIMEOUT_SECS"),
                REMUX_TIMEOUT_SECS,
            )?,
            upload_timeout_secs: parse_or(
                "UPLOAD_TIMEOUT_SECS",
                var("UPLOAD_TIMEOUT_SECS"),
                UPLOAD_TIMEOUT_SECS,
            )?,
            verify_uploads: parse_bool_or(var("VERIFY_UPLOADS"), true),
            thumbnail_cache_capacity: parse_or(
                "THUMBNAIL_CACHE_CAPACITY",
                var("THUMBNAIL_CACHE_CAPACITY"),
                THUMBNAIL_CACHE_CAPACITY,
            )?,
        };

        let config = Config {
            base,
            storage,
            media,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot serve uploads.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set for the s3 backend"));
                }
                if self.storage.s3_region.is_none() && self.storage.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set for the s3 backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set for the local backend"
                    ));
                }
            }
        }

        if self.storage.presign_expiry_secs == 0 {
            return Err(anyhow::anyhow!("PRESIGN_EXPIRY_SECS must be greater than 0"));
        }
        if self.media.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_BYTES must be greater than 0"));
        }
        for (key, secs) in [
            ("PROBE_TIMEOUT_SECS", self.media.probe_timeout_secs),
            ("REMUX_TIMEOUT_SECS", self.media.remux_timeout_secs),
            ("UPLOAD_TIMEOUT_SECS", self.media.upload_timeout_secs),
        ] {
            if secs == 0 {
                return Err(anyhow::anyhow!("{} must be greater than 0", key));
            }
        }
        if self.media.thumbnail_cache_capacity == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_CACHE_CAPACITY must be greater than 0"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.base.jwt_secret
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.storage.presign_expiry_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.media.probe_timeout_secs)
    }

    pub fn remux_timeout(&self) -> Duration {
        Duration::from_secs(self.media.remux_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.media.upload_timeout_secs)
    }
}
