use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{TransformRequest, TransformResponse};
use super::error::TransformError;
use super::services::{reject_malformed, run_transformation};
use crate::state::AppState;

/// Photos arrive base64 encoded, so the body can exceed the 10 MiB input cap by a third.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn transform_routes() -> Router<AppState> {
    Router::new()
        .route("/transformations", post(create_transformation))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[instrument(skip(state, payload))]
pub async fn create_transformation(
    State(state): State<AppState>,
    payload: Result<Json<TransformRequest>, JsonRejection>,
) -> Result<Json<TransformResponse>, TransformError> {
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable transformation body");
            return Err(reject_malformed(&state, rejection.body_text()).await);
        }
    };
    run_transformation(&state, payload).await.map(Json)
}
