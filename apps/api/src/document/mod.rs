//! Document collaborators: object storage, text parsing, and structured extraction.
//!
//! Each concern is a trait so the gateway pipeline can be driven by S3/pdf-extract/Claude
//! in production and by in-memory fakes in tests. `AppState` carries them as `Arc<dyn _>`.

pub mod extractor;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod storage;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::ResumeData;

/// Failures reported by document collaborators.
///
/// The `Display` form carries upstream detail and is for logs only.
/// Use [`DocumentError::summary`] for anything a client will see.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document could not be read: {0}")]
    Unreadable(String),

    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("extraction model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("extraction model returned malformed output: {0}")]
    MalformedOutput(String),
}

impl DocumentError {
    /// Short, client-safe description of the failure.
    pub fn summary(&self) -> String {
        match self {
            DocumentError::Unavailable(_) => "storage service unavailable".to_string(),
            DocumentError::UnsupportedFormat(format) => {
                format!("unsupported document format '{format}'")
            }
            DocumentError::Unreadable(_) => "document could not be read".to_string(),
            DocumentError::EmptyDocument => "document contains no extractable text".to_string(),
            DocumentError::ModelUnavailable(_) => "extraction model unavailable".to_string(),
            DocumentError::MalformedOutput(_) => {
                "extraction model returned an unreadable response".to_string()
            }
        }
    }
}

/// A file received from the client, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lower-cased extension of the client-supplied file name, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// Where an uploaded document ended up in object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub file_key: String,
    pub file_url: String,
    pub file_name: String,
    pub file_storage_name: String,
    pub content_type: String,
    pub file_size: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upload(
        &self,
        file: &UploadedFile,
        owner_id: Uuid,
    ) -> Result<UploadedDocument, DocumentError>;

    async fn download(&self, file_key: &str) -> Result<Bytes, DocumentError>;
}

#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Converts the raw document into plain text.
    async fn parse(&self, file: &UploadedFile) -> Result<String, DocumentError>;
}

#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    /// Turns resume plain text into the canonical structured record.
    async fn extract(&self, text: &str) -> Result<ResumeData, DocumentError>;
}
