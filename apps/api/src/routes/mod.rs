pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::document::handlers as documents;
use crate::gateway::handlers as gateway;
use crate::session_state::handlers as session_state;
use crate::state::AppState;

/// Resumes are small, but scanned PDFs easily exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Gateway: upload → parse → extract with SSE progress
        .route(
            "/api/v1/gateway/process-input-data",
            post(gateway::handle_process_input_data),
        )
        // Documents
        .route("/api/v1/documents/upload", post(documents::handle_upload))
        .route("/api/v1/documents/parse", post(documents::handle_parse))
        .route("/api/v1/documents/extract", post(documents::handle_extract))
        // Session state
        .route(
            "/api/v1/session-state",
            get(session_state::handle_get_session_state),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
