//! Cache-then-generate "after" photo pipeline.

mod dto;
pub mod error;
pub mod generator;
mod handlers;
pub mod prompt;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::transform_routes()
}
