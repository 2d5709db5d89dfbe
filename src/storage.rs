use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tokio::sync::OnceCell;

use crate::config::StorageConfig;

/// Write-once blob storage with publicly resolvable objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
}

/// S3/MinIO-backed store. The client is built on first upload so missing
/// credentials surface there rather than at startup.
pub struct S3BlobStore {
    config: StorageConfig,
    client: OnceCell<Client>,
}

impl S3BlobStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> anyhow::Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let (access_key, secret_key) = self.config.credentials()?;
                let shared = defaults(BehaviorVersion::latest())
                    .region(Region::new(self.config.region.clone()))
                    .credentials_provider(Credentials::new(
                        access_key, secret_key, None, None, "static",
                    ))
                    .endpoint_url(&self.config.endpoint)
                    .load()
                    .await;

                let conf = S3ConfigBuilder::from(&shared)
                    .endpoint_url(&self.config.endpoint)
                    .force_path_style(true)
                    .build();
                Ok::<_, anyhow::Error>(Client::from_conf(conf))
            })
            .await
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client()
            .await?
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.config.public_url, key)
    }
}

fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
