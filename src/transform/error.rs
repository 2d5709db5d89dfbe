use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::generator::GeneratorError;
use crate::error::ApiError;
use crate::imaging::OptimizeError;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Missing required parameters")]
    MissingParameters,
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    InvalidImage(OptimizeError),
    #[error("image generation failed: {0}")]
    Generation(#[from] GeneratorError),
    #[error("upload failed: {0:#}")]
    Upload(anyhow::Error),
    #[error("cache lookup failed: {0:#}")]
    Cache(anyhow::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<OptimizeError> for TransformError {
    fn from(e: OptimizeError) -> Self {
        if e.is_client_error() {
            TransformError::InvalidImage(e)
        } else {
            TransformError::Internal(e.to_string())
        }
    }
}

impl TransformError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransformError::MissingParameters
                | TransformError::MalformedBody(_)
                | TransformError::InvalidImage(_)
        )
    }
}

impl IntoResponse for TransformError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            ApiError::bad_request(self.to_string()).into_response()
        } else {
            // detail stays in the logs
            ApiError::internal("Failed to generate transformation")
                .with_fallback()
                .into_response()
        }
    }
}
