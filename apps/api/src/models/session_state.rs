use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::resume::ResumeData;

/// Raw `session_state` row. `document_data` is JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct SessionStateRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub document_name: Option<String>,
    pub document_url: Option<String>,
    pub document_parsed: Option<String>,
    pub document_data: Option<Value>,
    pub template_name: Option<String>,
    pub job_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-session working state: the uploaded resume, its text, and its structured record.
/// There is at most one per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub session_id: Uuid,
    pub document_name: Option<String>,
    pub document_url: Option<String>,
    pub document_parsed: Option<String>,
    pub document_data: Option<ResumeData>,
    pub template_name: Option<String>,
    pub job_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SessionStateRow> for SessionState {
    type Error = serde_json::Error;

    fn try_from(row: SessionStateRow) -> Result<Self, Self::Error> {
        let document_data = row.document_data.map(serde_json::from_value).transpose()?;
        Ok(SessionState {
            id: row.id,
            session_id: row.session_id,
            document_name: row.document_name,
            document_url: row.document_url,
            document_parsed: row.document_parsed,
            document_data,
            template_name: row.template_name,
            job_description: row.job_description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Partial write to a session's state. `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStateUpdate {
    pub document_name: Option<String>,
    pub document_url: Option<String>,
    pub document_parsed: Option<String>,
    pub document_data: Option<ResumeData>,
    pub template_name: Option<String>,
    pub job_description: Option<String>,
}

/// Only the in-memory test store builds states directly.
#[cfg(test)]
impl SessionState {
    /// Creates a fresh state for `session_id` from an update.
    pub fn new(session_id: Uuid, update: SessionStateUpdate) -> Self {
        let now = Utc::now();
        SessionState {
            id: Uuid::new_v4(),
            session_id,
            document_name: update.document_name,
            document_url: update.document_url,
            document_parsed: update.document_parsed,
            document_data: update.document_data,
            template_name: update.template_name,
            job_description: update.job_description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Folds an update into this state, keeping existing values for unset fields.
    pub fn apply(&mut self, update: SessionStateUpdate) {
        let SessionStateUpdate {
            document_name,
            document_url,
            document_parsed,
            document_data,
            template_name,
            job_description,
        } = update;
        if document_name.is_some() {
            self.document_name = document_name;
        }
        if document_url.is_some() {
            self.document_url = document_url;
        }
        if document_parsed.is_some() {
            self.document_parsed = document_parsed;
        }
        if document_data.is_some() {
            self.document_data = document_data;
        }
        if template_name.is_some() {
            self.template_name = template_name;
        }
        if job_description.is_some() {
            self.job_description = job_description;
        }
        self.updated_at = Utc::now();
    }
}
