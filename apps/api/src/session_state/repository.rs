use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::session_state::{SessionState, SessionStateRow, SessionStateUpdate};
use crate::session_state::SessionStateStore;

/// PostgreSQL-backed session state. Relies on the unique index on `session_id`.
#[derive(Clone)]
pub struct PgSessionStateStore {
    pool: PgPool,
}

impl PgSessionStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStateStore for PgSessionStateStore {
    async fn save(&self, session_id: Uuid, update: SessionStateUpdate) -> Result<SessionState> {
        let document_data = update
            .document_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to serialize document data")?;

        // Upsert: unset fields keep whatever the previous save stored.
        let row: SessionStateRow = sqlx::query_as(
            r#"
            INSERT INTO session_state
                (session_id, document_name, document_url, document_parsed,
                 document_data, template_name, job_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (session_id) DO UPDATE SET
                document_name   = COALESCE(EXCLUDED.document_name, session_state.document_name),
                document_url    = COALESCE(EXCLUDED.document_url, session_state.document_url),
                document_parsed = COALESCE(EXCLUDED.document_parsed, session_state.document_parsed),
                document_data   = COALESCE(EXCLUDED.document_data, session_state.document_data),
                template_name   = COALESCE(EXCLUDED.template_name, session_state.template_name),
                job_description = COALESCE(EXCLUDED.job_description, session_state.job_description),
                updated_at      = now()
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(update.document_name)
        .bind(update.document_url)
        .bind(update.document_parsed)
        .bind(document_data)
        .bind(update.template_name)
        .bind(update.job_description)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert session state")?;

        info!("Saved session state {} for session {session_id}", row.id);

        SessionState::try_from(row).context("Stored document data is not a valid resume record")
    }

    async fn get(&self, session_id: Uuid) -> Result<Option<SessionState>> {
        let row: Option<SessionStateRow> =
            sqlx::query_as("SELECT * FROM session_state WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to load session state")?;

        row.map(SessionState::try_from)
            .transpose()
            .context("Stored document data is not a valid resume record")
    }
}
