use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::compose::{compose, Report, ReportInput};
use crate::error::ApiError;
use crate::state::AppState;

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/reports", post(create_report))
}

/// Recomputes the report from the values the client already holds.
#[instrument(skip(state, payload))]
pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<ReportInput>,
) -> Result<Json<Report>, ApiError> {
    if !(payload.weight.is_finite() && payload.weight > 0.0) {
        return Err(ApiError::bad_request("Peso inválido"));
    }
    if !(payload.height.is_finite() && payload.height > 0.0) {
        return Err(ApiError::bad_request("Altura inválida"));
    }
    Ok(Json(compose(&payload, &state.symptoms)))
}
