//! In-memory collaborators for pipeline and handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::document::{
    DocumentError, DocumentParser, DocumentStore, ResumeExtractor, UploadedDocument, UploadedFile,
};
use crate::gateway::models::{PipelineInput, ProcessInput};
use crate::gateway::worker::{Collaborators, Step};
use crate::gateway::GatewaySettings;
use crate::models::resume::{Basics, ResumeData};
use crate::models::session_state::{SessionState, SessionStateUpdate};
use crate::session_state::SessionStateStore;
use crate::state::AppState;

pub const RESUME_TEXT: &str = "Ada Lovelace\nBackend engineer\nSkills: Rust, PostgreSQL";

pub fn sample_file() -> UploadedFile {
    UploadedFile {
        file_name: "resume.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from_static(RESUME_TEXT.as_bytes()),
    }
}

pub fn sample_input() -> PipelineInput {
    PipelineInput {
        file: sample_file(),
        metadata: ProcessInput {
            template_name: "default".to_string(),
            job_description: "Backend engineer...".to_string(),
        },
        owner_id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
    }
}

#[derive(Default)]
pub struct FakeDocumentStore {
    fail: bool,
    objects: Mutex<HashMap<String, Bytes>>,
}

impl FakeDocumentStore {
    pub fn upload_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn upload(
        &self,
        file: &UploadedFile,
        owner_id: Uuid,
    ) -> Result<UploadedDocument, DocumentError> {
        if self.fail {
            return Err(DocumentError::Unavailable(
                "connect timeout to s3 with secret key AKIA...".to_string(),
            ));
        }
        let file_storage_name = format!("{}.pdf", Uuid::new_v4());
        let file_key = format!("20261019/{owner_id}/{file_storage_name}");
        self.objects
            .lock()
            .unwrap()
            .insert(file_key.clone(), file.bytes.clone());
        Ok(UploadedDocument {
            file_url: format!("https://bucket.example/{file_key}"),
            file_key,
            file_storage_name,
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            file_size: file.bytes.len() as u64,
        })
    }

    async fn download(&self, file_key: &str) -> Result<Bytes, DocumentError> {
        self.objects
            .lock()
            .unwrap()
            .get(file_key)
            .cloned()
            .ok_or_else(|| DocumentError::Unavailable(format!("no such key {file_key}")))
    }
}

/// Treats the file bytes as UTF-8 text regardless of declared type.
#[derive(Default)]
pub struct FakeParser {
    fail: bool,
}

#[async_trait]
impl DocumentParser for FakeParser {
    async fn parse(&self, file: &UploadedFile) -> Result<String, DocumentError> {
        if self.fail {
            return Err(DocumentError::UnsupportedFormat("png".to_string()));
        }
        String::from_utf8(file.bytes.to_vec())
            .map_err(|e| DocumentError::Unreadable(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractorBehavior {
    Succeed,
    Unavailable,
    Panic,
    /// Never returns.
    Hang,
}

pub struct FakeExtractor {
    behavior: ExtractorBehavior,
    name: Mutex<String>,
}

impl FakeExtractor {
    fn new(behavior: ExtractorBehavior) -> Self {
        Self {
            behavior,
            name: Mutex::new("Ada Lovelace".to_string()),
        }
    }

    /// Changes the name put into subsequent records.
    pub fn set_name(&self, name: &str) {
        *self.name.lock().unwrap() = name.to_string();
    }
}

#[async_trait]
impl ResumeExtractor for FakeExtractor {
    async fn extract(&self, _text: &str) -> Result<ResumeData, DocumentError> {
        match self.behavior {
            ExtractorBehavior::Succeed => {
                let mut data = ResumeData {
                    basics: Basics {
                        name: Some(self.name.lock().unwrap().clone()),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                data.skills.insert(
                    "Programming Languages".to_string(),
                    vec!["Rust".to_string()],
                );
                Ok(data)
            }
            ExtractorBehavior::Unavailable => Err(DocumentError::ModelUnavailable(
                "ModelUnavailable: 529 overloaded (api key secret-123)".to_string(),
            )),
            ExtractorBehavior::Panic => panic!("extractor blew up"),
            ExtractorBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Create-or-update store keyed by session id, with optional failure on the n-th save.
#[derive(Default)]
pub struct MemorySessionStateStore {
    states: Mutex<HashMap<Uuid, SessionState>>,
    saves: AtomicUsize,
    fail_on_save: Option<usize>,
}

impl MemorySessionStateStore {
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    pub fn stored(&self, session_id: Uuid) -> Option<SessionState> {
        self.states.lock().unwrap().get(&session_id).cloned()
    }
}

#[async_trait]
impl SessionStateStore for MemorySessionStateStore {
    async fn save(&self, session_id: Uuid, update: SessionStateUpdate) -> Result<SessionState> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_save == Some(attempt) {
            return Err(anyhow!("connection refused (postgres://tailor:hunter2@db)"));
        }
        let mut states = self.states.lock().unwrap();
        let state = match states.get_mut(&session_id) {
            Some(existing) => {
                existing.apply(update);
                existing.clone()
            }
            None => {
                let created = SessionState::new(session_id, update);
                states.insert(session_id, created.clone());
                created
            }
        };
        Ok(state)
    }

    async fn get(&self, session_id: Uuid) -> Result<Option<SessionState>> {
        Ok(self.stored(session_id))
    }
}

/// A full set of fakes. Keeps typed handles so tests can inspect what happened.
pub struct Fakes {
    pub documents: Arc<FakeDocumentStore>,
    pub parser: Arc<FakeParser>,
    pub extractor: Arc<FakeExtractor>,
    pub session_states: Arc<MemorySessionStateStore>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(FakeDocumentStore::default()),
            parser: Arc::new(FakeParser::default()),
            extractor: Arc::new(FakeExtractor::new(ExtractorBehavior::Succeed)),
            session_states: Arc::new(MemorySessionStateStore::default()),
        }
    }

    /// Fakes whose collaborator for `step` fails.
    pub fn failing_at(step: Step) -> Self {
        let fakes = Self::new();
        match step {
            Step::Upload => Self {
                documents: Arc::new(FakeDocumentStore {
                    fail: true,
                    ..Default::default()
                }),
                ..fakes
            },
            Step::Save => fakes.with_failing_save(1),
            Step::Parse => Self {
                parser: Arc::new(FakeParser { fail: true }),
                ..fakes
            },
            Step::Extract => fakes.with_extractor(ExtractorBehavior::Unavailable),
            Step::Persist => fakes.with_failing_save(2),
        }
    }

    pub fn with_extractor(self, behavior: ExtractorBehavior) -> Self {
        Self {
            extractor: Arc::new(FakeExtractor::new(behavior)),
            ..self
        }
    }

    fn with_failing_save(self, attempt: usize) -> Self {
        Self {
            session_states: Arc::new(MemorySessionStateStore {
                fail_on_save: Some(attempt),
                ..Default::default()
            }),
            ..self
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            documents: self.documents.clone(),
            parser: self.parser.clone(),
            extractor: self.extractor.clone(),
            session_states: self.session_states.clone(),
        }
    }

    pub fn app_state(&self, gateway: GatewaySettings) -> AppState {
        AppState {
            documents: self.documents.clone(),
            parser: self.parser.clone(),
            extractor: self.extractor.clone(),
            session_states: self.session_states.clone(),
            gateway,
        }
    }
}
