use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::health::SymptomGuide;
use crate::leads::repo::{LeadRepository, PgLeadRepository};
use crate::storage::{BlobStore, S3BlobStore};
use crate::transform::generator::{HttpImageGenerator, ImageGenerator};
use crate::transform::repo::{PgTransformCache, PgTransformLog, TransformCache, TransformLog};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn BlobStore>,
    pub generator: Arc<dyn ImageGenerator>,
    pub cache: Arc<dyn TransformCache>,
    pub logs: Arc<dyn TransformLog>,
    pub leads: Arc<dyn LeadRepository>,
    pub symptoms: SymptomGuide,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migrations failed; continuing");
        }

        let generator = HttpImageGenerator::new(config.ai.clone()).context("build ai client")?;

        Ok(Self {
            storage: Arc::new(S3BlobStore::new(config.storage.clone())),
            generator: Arc::new(generator),
            cache: Arc::new(PgTransformCache::new(db.clone())),
            logs: Arc::new(PgTransformLog::new(db.clone())),
            leads: Arc::new(PgLeadRepository::new(db)),
            symptoms: SymptomGuide::standard(),
            config,
        })
    }
}
