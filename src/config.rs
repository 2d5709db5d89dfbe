use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

use crate::imaging::OptimizeOptions;

/// A secret that is read at start but only required when first used.
#[derive(Debug, Error)]
#[error("missing required credential {0}")]
pub struct MissingCredential(pub &'static str);

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn api_key(&self) -> Result<&str, MissingCredential> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(MissingCredential("AI_API_KEY"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    /// Base that object keys are appended to for public URLs.
    pub public_url: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl StorageConfig {
    pub fn credentials(&self) -> Result<(&str, &str), MissingCredential> {
        let access = self
            .access_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(MissingCredential("STORAGE_ACCESS_KEY"))?;
        let secret = self
            .secret_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(MissingCredential("STORAGE_SECRET_KEY"))?;
        Ok((access, secret))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub ai: AiConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    pub max_dimension: u32,
    pub quality: f32,
    pub max_size_kb: u32,
}

impl ImageConfig {
    pub fn optimize_options(&self) -> OptimizeOptions {
        OptimizeOptions {
            max_width: self.max_dimension,
            max_height: self.max_dimension,
            quality: self.quality,
            max_size_kb: self.max_size_kb,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let storage_endpoint = env_or("STORAGE_ENDPOINT", "http://localhost:9000");
        let storage_bucket = env_or("STORAGE_BUCKET", "transformations");
        let default_public = format!(
            "{}/{}",
            storage_endpoint.trim_end_matches('/'),
            storage_bucket
        );

        Ok(Self {
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("APP_PORT", 8080)?,
            database_url,
            ai: AiConfig {
                base_url: env_or("AI_BASE_URL", "https://ai.gateway.lovable.dev/v1"),
                model: env_or("AI_MODEL", "google/gemini-2.5-flash-image-preview"),
                api_key: std::env::var("AI_API_KEY").ok(),
                timeout_secs: env_parse("AI_TIMEOUT_SECS", 30)?,
            },
            storage: StorageConfig {
                public_url: env_or("STORAGE_PUBLIC_URL", &default_public),
                endpoint: storage_endpoint,
                bucket: storage_bucket,
                region: env_or("STORAGE_REGION", "us-east-1"),
                access_key: std::env::var("STORAGE_ACCESS_KEY").ok(),
                secret_key: std::env::var("STORAGE_SECRET_KEY").ok(),
            },
            cache: CacheConfig {
                ttl_hours: env_parse("CACHE_TTL_HOURS", 24)?,
            },
            image: ImageConfig {
                max_dimension: env_parse("IMAGE_MAX_DIMENSION", 1024)?,
                quality: env_parse("IMAGE_QUALITY", 0.85)?,
                max_size_kb: env_parse("IMAGE_MAX_SIZE_KB", 1024)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
