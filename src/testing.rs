//! In-memory stand-ins for every external dependency of `AppState`.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use time::OffsetDateTime;

use crate::config::{AiConfig, AppConfig, CacheConfig, ImageConfig, StorageConfig};
use crate::health::SymptomGuide;
use crate::imaging::to_data_url;
use crate::leads::repo::{LeadRepository, NewLead};
use crate::state::AppState;
use crate::storage::BlobStore;
use crate::transform::generator::{GeneratedImage, GeneratorError, ImageGenerator};
use crate::transform::repo::{CacheEntry, LogEntry, TransformCache, TransformLog};

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: "postgres://fake".into(),
        ai: AiConfig {
            base_url: "http://fake.local/v1".into(),
            model: "fake-model".into(),
            api_key: Some("fake".into()),
            timeout_secs: 5,
        },
        storage: StorageConfig {
            endpoint: "http://fake.local".into(),
            bucket: "bucket".into(),
            region: "us-east-1".into(),
            public_url: "http://fake.local/bucket".into(),
            access_key: Some("fake".into()),
            secret_key: Some("fake".into()),
        },
        cache: CacheConfig { ttl_hours: 24 },
        image: ImageConfig {
            max_dimension: 1024,
            quality: 0.85,
            max_size_kb: 1024,
        },
    }
}

/// Gradient PNG so the encoder has something non-trivial to compress.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn sample_data_url(width: u32, height: u32) -> String {
    to_data_url("image/png", &sample_png(width, height))
}

#[derive(Debug, Clone)]
pub struct GeneratorCall {
    pub source: Vec<u8>,
    pub mime: String,
    pub prompt: String,
}

#[derive(Default)]
pub struct FakeGenerator {
    calls: Mutex<Vec<GeneratorCall>>,
    failing: bool,
    delay: Option<Duration>,
}

impl FakeGenerator {
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<GeneratorCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(
        &self,
        source: &[u8],
        source_mime: &str,
        prompt: &str,
    ) -> Result<GeneratedImage, GeneratorError> {
        self.calls.lock().unwrap().push(GeneratorCall {
            source: source.to_vec(),
            mime: source_mime.to_string(),
            prompt: prompt.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(GeneratorError::Status {
                status: 502,
                body: "upstream unavailable".into(),
            });
        }
        Ok(GeneratedImage {
            bytes: Bytes::from(sample_png(8, 8)),
            content_type: "image/png".into(),
        })
    }
}

#[derive(Default)]
pub struct MemoryCache {
    rows: Mutex<Vec<CacheEntry>>,
    lookups: AtomicUsize,
}

impl MemoryCache {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn entries(&self) -> Vec<CacheEntry> {
        self.rows.lock().unwrap().clone()
    }

    pub fn expire_all(&self) {
        let past = OffsetDateTime::now_utc() - time::Duration::hours(1);
        for row in self.rows.lock().unwrap().iter_mut() {
            row.expires_at = past;
        }
    }
}

#[async_trait]
impl TransformCache for MemoryCache {
    async fn find_valid(
        &self,
        hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<CacheEntry>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.original_hash == hash && r.expires_at > now)
            .max_by_key(|r| r.expires_at)
            .cloned())
    }

    async fn insert(&self, entry: &CacheEntry) -> anyhow::Result<()> {
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLog {
    rows: Mutex<Vec<LogEntry>>,
    broken: AtomicBool,
}

impl MemoryLog {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_writes(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransformLog for MemoryLog {
    async fn append(&self, entry: &LogEntry) -> anyhow::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(anyhow!("log table unavailable"));
        }
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<Vec<(String, Bytes, String)>>,
    broken: AtomicBool,
}

impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn fail_writes(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(anyhow!("bucket unavailable"));
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), body, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://fake.local/{}", key)
    }
}

#[derive(Default)]
pub struct MemoryLeads {
    rows: Mutex<Vec<NewLead>>,
    broken: AtomicBool,
}

impl MemoryLeads {
    pub fn entries(&self) -> Vec<NewLead> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_writes(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LeadRepository for MemoryLeads {
    async fn insert(&self, lead: &NewLead) -> anyhow::Result<OffsetDateTime> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(anyhow!("leads table unavailable"));
        }
        self.rows.lock().unwrap().push(lead.clone());
        Ok(OffsetDateTime::now_utc())
    }
}

/// `AppState` wired to fakes, with handles kept for assertions.
pub struct Harness {
    pub state: AppState,
    pub generator: Arc<FakeGenerator>,
    pub cache: Arc<MemoryCache>,
    pub logs: Arc<MemoryLog>,
    pub storage: Arc<MemoryBlobStore>,
    pub leads: Arc<MemoryLeads>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_generator(FakeGenerator::default(), test_config())
    }

    pub fn failing_generator() -> Self {
        Self::with_generator(
            FakeGenerator {
                failing: true,
                ..Default::default()
            },
            test_config(),
        )
    }

    /// Generator that answers long after the configured one-second timeout.
    pub fn slow_generator() -> Self {
        let mut config = test_config();
        config.ai.timeout_secs = 1;
        Self::with_generator(
            FakeGenerator {
                delay: Some(Duration::from_secs(30)),
                ..Default::default()
            },
            config,
        )
    }

    fn with_generator(generator: FakeGenerator, config: AppConfig) -> Self {
        let generator = Arc::new(generator);
        let cache = Arc::new(MemoryCache::default());
        let logs = Arc::new(MemoryLog::default());
        let storage = Arc::new(MemoryBlobStore::default());
        let leads = Arc::new(MemoryLeads::default());
        let state = AppState {
            config: Arc::new(config),
            storage: storage.clone(),
            generator: generator.clone(),
            cache: cache.clone(),
            logs: logs.clone(),
            leads: leads.clone(),
            symptoms: SymptomGuide::standard(),
        };
        Self {
            state,
            generator,
            cache,
            logs,
            storage,
            leads,
        }
    }
}
