use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session_state::SessionState;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SessionIdQuery {
    pub session_id: Uuid,
}

/// GET /api/v1/session-state
/// Returns the session's stored state, or `null` when nothing has been saved yet.
pub async fn handle_get_session_state(
    State(state): State<AppState>,
    Query(params): Query<SessionIdQuery>,
) -> Result<Json<Option<SessionState>>, AppError> {
    let session_state = state.session_states.get(params.session_id).await?;
    Ok(Json(session_state))
}
