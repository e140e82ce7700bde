use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::document::UploadedFile;

/// Pipeline stage reported to the client, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Uploading,
    Saving,
    Parsing,
    Extracting,
    Success,
    Failed,
}

impl EventStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Success | EventStatus::Failed)
    }
}

/// One progress frame. Serialized as `{"status": ..., "data": {...}}`, `data` omitted when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
}

impl ProgressEvent {
    pub fn new(status: EventStatus, data: Option<Map<String, Value>>) -> Self {
        Self { status, data }
    }

    /// A `failed` event carrying `{"error": message}`.
    pub fn failed(message: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("error".to_string(), Value::String(message.into()));
        Self::new(EventStatus::Failed, Some(data))
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }
}

/// Form fields the client sends alongside the resume file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInput {
    pub template_name: String,
    pub job_description: String,
}

/// Everything one pipeline run needs. Moved into the worker task.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub file: UploadedFile,
    pub metadata: ProcessInput,
    pub owner_id: Uuid,
    pub session_id: Uuid,
}
