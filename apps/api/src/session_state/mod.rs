//! Session state persistence: one working record per session, written by the gateway pipeline.

pub mod handlers;
pub mod repository;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::session_state::{SessionState, SessionStateUpdate};

/// Storage for per-session state.
///
/// `save` is create-or-update keyed by `session_id`: saving twice for the same session
/// leaves one record holding the latest values.
#[async_trait]
pub trait SessionStateStore: Send + Sync {
    async fn save(&self, session_id: Uuid, update: SessionStateUpdate) -> Result<SessionState>;

    async fn get(&self, session_id: Uuid) -> Result<Option<SessionState>>;
}
