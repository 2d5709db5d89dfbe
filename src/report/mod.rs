//! Health report composition and the endpoint that re-renders it.

pub mod compose;
mod handlers;

pub use compose::{compose, Report, ReportInput};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::report_routes()
}
