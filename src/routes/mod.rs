//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One HTML page at `/` shows either the intake form or the running
//! consultation. Form posts apply a single state transition and redirect
//! back to `/` (post/redirect/get), so a reload never replays an input.
//! `/api/session` exposes the same state as JSON for tooling.

pub mod consultation;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(consultation::index))
        .route("/consultation", post(consultation::submit))
        .route("/consultation/messages", post(consultation::send_message))
        .route("/consultation/reset", post(consultation::reset))
        .route("/api/session", get(consultation::session_snapshot))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
