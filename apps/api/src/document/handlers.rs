//! Axum route handlers for standalone document operations, plus the multipart form reader
//! shared with the gateway.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{UploadedDocument, UploadedFile};
use crate::errors::AppError;
use crate::models::resume::ResumeData;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A buffered multipart form: the `file` part and any text parts.
#[derive(Debug, Default)]
pub struct FormData {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// The uploaded file; must be present and non-empty.
    pub fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        match self.file.take() {
            Some(file) if !file.bytes.is_empty() => Ok(file),
            Some(_) => Err(AppError::Validation("Uploaded file is empty".to_string())),
            None => Err(AppError::Validation("Missing required field 'file'".to_string())),
        }
    }

    /// A text field that must be present and not blank.
    pub fn take_text(&mut self, name: &str) -> Result<String, AppError> {
        self.fields
            .remove(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::Validation(format!("Missing required field '{name}'")))
    }
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub file_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub file_content: String,
}

/// POST /api/v1/documents/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
    multipart: Multipart,
) -> Result<Json<UploadedDocument>, AppError> {
    let file = FormData::read(multipart).await?.take_file()?;
    let uploaded = state.documents.upload(&file, params.user_id).await?;
    Ok(Json(uploaded))
}

/// POST /api/v1/documents/parse
/// Parses a previously uploaded document by its storage key.
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    if req.file_key.trim().is_empty() {
        return Err(AppError::Validation("file_key must not be empty".to_string()));
    }
    let bytes = state.documents.download(&req.file_key).await?;
    let file = UploadedFile {
        file_name: req
            .file_key
            .rsplit('/')
            .next()
            .unwrap_or(&req.file_key)
            .to_string(),
        content_type: DEFAULT_CONTENT_TYPE.to_string(),
        bytes,
    };
    let text = state.parser.parse(&file).await?;
    Ok(Json(ParseResponse { text }))
}

/// POST /api/v1/documents/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ResumeData>, AppError> {
    if req.file_content.trim().is_empty() {
        return Err(AppError::Validation(
            "file_content must not be empty".to_string(),
        ));
    }
    let data = state.extractor.extract(&req.file_content).await?;
    Ok(Json(data))
}
