use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::dto::{TransformRequest, TransformResponse, ValidTransformRequest};
use super::error::TransformError;
use super::generator::{GeneratedImage, GeneratorError};
use super::prompt::build_prompt;
use super::repo::{CacheEntry, LogEntry, LogStatus};
use crate::imaging::{data_url::estimate_size_kb, optimize, parse_data_url, OptimizedImage};
use crate::state::AppState;
use crate::storage::ext_from_mime;

/// SHA-256 of the optimized image, hex encoded. The cache key.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Runs one transformation and appends its outcome to the log store.
///
/// Log-write failures are swallowed: telemetry must never change the response.
pub async fn run_transformation(
    st: &AppState,
    req: TransformRequest,
) -> Result<TransformResponse, TransformError> {
    let started = Instant::now();
    let lead_id = req.lead_id;
    let result = transform(st, req).await;
    record_attempt(st, lead_id, result.as_ref().err(), started).await;
    result
}

/// Logs a request whose body could not be parsed and returns the client error for it.
pub async fn reject_malformed(st: &AppState, detail: String) -> TransformError {
    let started = Instant::now();
    let err = TransformError::MalformedBody(detail);
    record_attempt(st, None, Some(&err), started).await;
    err
}

async fn record_attempt(
    st: &AppState,
    lead_id: Option<Uuid>,
    failure: Option<&TransformError>,
    started: Instant,
) {
    let entry = LogEntry {
        lead_id,
        status: if failure.is_none() {
            LogStatus::Success
        } else {
            LogStatus::Error
        },
        error_message: failure.map(|e| e.to_string()),
        processing_time_ms: i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX),
    };
    if let Err(e) = st.logs.append(&entry).await {
        warn!(error = %e, "transformation log write failed");
    }
}

async fn transform(
    st: &AppState,
    req: TransformRequest,
) -> Result<TransformResponse, TransformError> {
    let valid = req.validate().ok_or(TransformError::MissingParameters)?;
    let optimized = optimize_upload(st, &valid).await?;
    let hash = content_hash(&optimized.bytes);

    let now = OffsetDateTime::now_utc();
    if let Some(hit) = st
        .cache
        .find_valid(&hash, now)
        .await
        .map_err(TransformError::Cache)?
    {
        info!(%hash, "transformation cache hit");
        return Ok(TransformResponse {
            transformed_image: hit.transformed_url,
            cached: true,
        });
    }

    debug!(%hash, "transformation cache miss");
    let generated = generate(st, &valid, &optimized).await?;
    let url = upload(st, generated).await?;

    let entry = CacheEntry {
        original_hash: hash.clone(),
        transformed_url: url.clone(),
        expires_at: now + time::Duration::hours(st.config.cache.ttl_hours),
        lead_id: req.lead_id,
    };
    if let Err(e) = st.cache.insert(&entry).await {
        // the image is stored and reachable; only reuse is lost
        warn!(error = %e, %hash, "transformation cache write failed");
    }

    info!(%hash, %url, "transformation generated");
    Ok(TransformResponse {
        transformed_image: url,
        cached: false,
    })
}

async fn optimize_upload(
    st: &AppState,
    valid: &ValidTransformRequest,
) -> Result<OptimizedImage, TransformError> {
    debug!(
        payload_kb = estimate_size_kb(&valid.image_base64),
        "decoding uploaded photo"
    );
    let decoded = parse_data_url(&valid.image_base64)?;
    let opts = st.config.image.optimize_options();
    tokio::task::spawn_blocking(move || optimize(&decoded.bytes, &decoded.mime, &opts))
        .await
        .map_err(|e| TransformError::Internal(format!("optimizer task failed: {e}")))?
        .map_err(TransformError::from)
}

async fn generate(
    st: &AppState,
    valid: &ValidTransformRequest,
    source: &OptimizedImage,
) -> Result<GeneratedImage, TransformError> {
    let prompt = build_prompt(valid.current_weight, valid.goal_weight, valid.height);
    let limit = Duration::from_secs(st.config.ai.timeout_secs);

    let generated = tokio::time::timeout(
        limit,
        st.generator.generate(&source.bytes, source.mime(), &prompt),
    )
    .await
    .map_err(|_| GeneratorError::Timeout(format!("no answer within {}s", limit.as_secs())))
    .and_then(|r| r)
    .map_err(|e| {
        error!(error = %e, "image generation failed");
        TransformError::Generation(e)
    })?;
    Ok(generated)
}

async fn upload(st: &AppState, image: GeneratedImage) -> Result<String, TransformError> {
    let ext = ext_from_mime(&image.content_type).unwrap_or("png");
    let key = format!("transformations/{}.{}", Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, image.bytes, &image.content_type)
        .await
        .map_err(|e| {
            error!(error = %e, %key, "transformation upload failed");
            TransformError::Upload(e)
        })?;
    Ok(st.storage.public_url(&key))
}

#[cfg(test)]
mod transform_service_tests {
    use super::*;
    use crate::testing::{sample_data_url, Harness};

    fn request(image: Option<String>, height: Option<f64>) -> TransformRequest {
        TransformRequest {
            image_base64: image,
            current_weight: Some(75.0),
            goal_weight: Some(59.9),
            height,
            lead_id: None,
        }
    }

    #[test]
    fn content_hash_is_stable_hex() {
        let a = content_hash(b"photo");
        assert_eq!(a.len(), 64);
        assert_eq!(a, content_hash(b"photo"));
        assert_ne!(a, content_hash(b"photo2"));
    }

    #[tokio::test]
    async fn missing_height_fails_fast_without_external_calls() {
        let h = Harness::new();
        let err = run_transformation(&h.state, request(Some(sample_data_url(40, 60)), None))
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::MissingParameters));
        assert!(err.is_client_error());
        assert_eq!(h.generator.calls(), 0);
        assert_eq!(h.cache.lookups(), 0);
        assert_eq!(h.storage.len(), 0);
        let logs = h.logs.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Error);
        assert_eq!(logs[0].error_message.as_deref(), Some("Missing required parameters"));
    }

    #[tokio::test]
    async fn identical_photo_is_served_from_cache_the_second_time() {
        let h = Harness::new();
        let photo = sample_data_url(120, 160);

        let first = run_transformation(&h.state, request(Some(photo.clone()), Some(165.0)))
            .await
            .unwrap();
        assert!(!first.cached);
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.storage.len(), 1);
        assert_eq!(h.cache.len(), 1);
        assert!(first.transformed_image.starts_with("https://fake.local/transformations/"));

        let second = run_transformation(&h.state, request(Some(photo), Some(165.0)))
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.transformed_image, first.transformed_image);
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.storage.len(), 1);

        let logs = h.logs.entries();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.status == LogStatus::Success));
    }

    #[tokio::test]
    async fn generator_prompt_and_source_are_forwarded() {
        let h = Harness::new();
        run_transformation(&h.state, request(Some(sample_data_url(50, 50)), Some(165.0)))
            .await
            .unwrap();
        let seen = h.generator.last_call().unwrap();
        assert_eq!(seen.mime, "image/jpeg");
        assert_eq!(&seen.source[..2], &[0xFF, 0xD8]);
        assert!(seen.prompt.contains("BMI 27.5"));
    }

    #[tokio::test]
    async fn expired_entry_is_regenerated() {
        let h = Harness::new();
        let photo = sample_data_url(64, 64);
        let first = run_transformation(&h.state, request(Some(photo.clone()), Some(165.0)))
            .await
            .unwrap();

        h.cache.expire_all();
        let second = run_transformation(&h.state, request(Some(photo), Some(165.0)))
            .await
            .unwrap();
        assert!(!second.cached);
        assert_ne!(second.transformed_image, first.transformed_image);
        assert_eq!(h.generator.calls(), 2);
    }

    #[tokio::test]
    async fn generator_failure_returns_fallback_error_and_logs_it() {
        let h = Harness::failing_generator();
        let err = run_transformation(&h.state, request(Some(sample_data_url(64, 64)), Some(165.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::Generation(_)));
        assert!(!err.is_client_error());
        assert_eq!(h.cache.len(), 0);
        assert_eq!(h.storage.len(), 0);
        let logs = h.logs.entries();
        assert_eq!(logs[0].status, LogStatus::Error);
        assert!(logs[0].error_message.as_deref().unwrap().contains("image generation failed"));
    }

    #[tokio::test]
    async fn log_write_failure_does_not_change_the_response() {
        let h = Harness::new();
        h.logs.fail_writes();
        let res = run_transformation(&h.state, request(Some(sample_data_url(32, 32)), Some(165.0)))
            .await
            .unwrap();
        assert!(!res.cached);
        assert!(h.logs.entries().is_empty());
    }

    #[tokio::test]
    async fn invalid_image_is_a_client_error() {
        let h = Harness::new();
        let err = run_transformation(
            &h.state,
            request(Some("data:image/gif;base64,R0lGODdh".into()), Some(165.0)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransformError::InvalidImage(_)));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn lead_id_is_recorded_on_cache_and_log() {
        let h = Harness::new();
        let lead_id = Uuid::new_v4();
        let mut req = request(Some(sample_data_url(20, 20)), Some(165.0));
        req.lead_id = Some(lead_id);
        run_transformation(&h.state, req).await.unwrap();
        assert_eq!(h.logs.entries()[0].lead_id, Some(lead_id));
        assert_eq!(h.cache.entries()[0].lead_id, Some(lead_id));
    }

    #[tokio::test]
    async fn slow_generator_times_out_into_a_logged_dependency_error() {
        let h = Harness::slow_generator();
        let err = run_transformation(&h.state, request(Some(sample_data_url(32, 32)), Some(165.0)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransformError::Generation(GeneratorError::Timeout(_))
        ));
        assert!(!err.is_client_error());
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.storage.len(), 0);
        assert_eq!(h.cache.len(), 0);
        let logs = h.logs.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Error);
        assert!(logs[0].error_message.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn upload_failure_skips_the_cache_and_is_logged() {
        let h = Harness::new();
        h.storage.fail_writes();
        let err = run_transformation(&h.state, request(Some(sample_data_url(32, 32)), Some(165.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::Upload(_)));
        assert!(!err.is_client_error());
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.cache.len(), 0);
        let logs = h.logs.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Error);
        assert!(logs[0].error_message.as_deref().unwrap().contains("bucket unavailable"));
    }

    #[tokio::test]
    async fn malformed_body_is_logged_as_a_client_error() {
        let h = Harness::new();
        let err = reject_malformed(&h.state, "expected value at line 1".into()).await;
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Invalid request body: expected value at line 1");
        let logs = h.logs.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].lead_id, None);
        assert_eq!(logs[0].error_message.as_deref(), Some(err.to_string().as_str()));
    }
}
