use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{instrument, warn};

use super::dto::{CreateLeadRequest, LeadCreatedResponse};
use super::services::{create_lead, LeadError};
use crate::state::AppState;

pub fn lead_routes() -> Router<AppState> {
    Router::new().route("/leads", post(submit_lead))
}

#[instrument(skip(state, payload))]
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<LeadCreatedResponse>), LeadError> {
    match create_lead(&state, payload).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => {
            if !matches!(e, LeadError::Persist(_)) {
                warn!(error = %e, "lead rejected");
            }
            Err(e)
        }
    }
}
