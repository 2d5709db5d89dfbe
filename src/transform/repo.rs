use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CacheEntry {
    pub original_hash: String,
    pub transformed_url: String,
    pub expires_at: OffsetDateTime,
    pub lead_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub lead_id: Option<Uuid>,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub processing_time_ms: i32,
}

/// Content-hash keyed cache of generated images.
#[async_trait]
pub trait TransformCache: Send + Sync {
    /// Entry for `hash` whose expiry is after `now`, if any.
    async fn find_valid(&self, hash: &str, now: OffsetDateTime)
        -> anyhow::Result<Option<CacheEntry>>;
    async fn insert(&self, entry: &CacheEntry) -> anyhow::Result<()>;
}

/// Append-only record of transformation attempts.
#[async_trait]
pub trait TransformLog: Send + Sync {
    async fn append(&self, entry: &LogEntry) -> anyhow::Result<()>;
}

pub struct PgTransformCache {
    db: PgPool,
}

impl PgTransformCache {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransformCache for PgTransformCache {
    async fn find_valid(
        &self,
        hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<CacheEntry>> {
        let row = sqlx::query_as::<_, CacheEntry>(
            r#"
            SELECT original_hash, transformed_url, expires_at, lead_id
              FROM transformation_cache
             WHERE original_hash = $1 AND expires_at > $2
             ORDER BY expires_at DESC
             LIMIT 1
            "#,
        )
        .bind(hash)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("select transformation_cache")?;
        Ok(row)
    }

    async fn insert(&self, entry: &CacheEntry) -> anyhow::Result<()> {
        // No uniqueness on the hash: concurrent misses and post-expiry
        // regenerations each add a row, reads pick the latest valid one.
        sqlx::query(
            r#"
            INSERT INTO transformation_cache (original_hash, transformed_url, expires_at, lead_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.original_hash)
        .bind(&entry.transformed_url)
        .bind(entry.expires_at)
        .bind(entry.lead_id)
        .execute(&self.db)
        .await
        .context("insert transformation_cache")?;
        Ok(())
    }
}

pub struct PgTransformLog {
    db: PgPool,
}

impl PgTransformLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransformLog for PgTransformLog {
    async fn append(&self, entry: &LogEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transformation_logs (lead_id, status, error_message, processing_time_ms)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.lead_id)
        .bind(entry.status.as_str())
        .bind(entry.error_message.as_deref())
        .bind(entry.processing_time_ms)
        .execute(&self.db)
        .await
        .context("insert transformation_logs")?;
        Ok(())
    }
}
