//! Pipeline worker: upload → save → parse → extract → persist for one resume,
//! reporting progress through a [`ProgressEmitter`].

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::document::{
    DocumentError, DocumentParser, DocumentStore, ResumeExtractor, UploadedDocument,
};
use crate::gateway::emitter::ProgressEmitter;
use crate::gateway::models::{EventStatus, PipelineInput};
use crate::models::resume::ResumeData;
use crate::models::session_state::{SessionState, SessionStateUpdate};
use crate::session_state::SessionStateStore;

/// Pipeline steps in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Save,
    Parse,
    Extract,
    Persist,
}

impl Step {
    /// The status announced before the step runs. Persisting is not reported separately.
    pub fn status(self) -> Option<EventStatus> {
        match self {
            Step::Upload => Some(EventStatus::Uploading),
            Step::Save => Some(EventStatus::Saving),
            Step::Parse => Some(EventStatus::Parsing),
            Step::Extract => Some(EventStatus::Extracting),
            Step::Persist => None,
        }
    }

    fn action(self) -> &'static str {
        match self {
            Step::Upload => "upload document",
            Step::Save => "save session state",
            Step::Parse => "parse document",
            Step::Extract => "extract document",
            Step::Persist => "persist extracted resume",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("session state store: {0:#}")]
    SessionState(#[from] anyhow::Error),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl StepError {
    fn summary(&self) -> String {
        match self {
            StepError::Document(e) => e.summary(),
            StepError::SessionState(_) => "session storage unavailable".to_string(),
            StepError::Panicked(_) => "internal error".to_string(),
        }
    }
}

/// A step that did not complete.
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub error: StepError,
}

impl StepFailure {
    /// Message safe to send to the client: names the step and the kind of failure only.
    pub fn public_message(&self) -> String {
        format!("Failed to {}: {}", self.step, self.error.summary())
    }
}

/// Outputs gathered as the run advances. Each step fills its own slot.
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    pub upload: Option<UploadedDocument>,
    pub parsed_text: Option<String>,
    pub record: Option<ResumeData>,
    pub stored: Option<SessionState>,
}

#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(PipelineResult),
    Failed(StepFailure),
    /// Stopped because the stream reader went away or stalled; carries the step that was skipped
    /// or interrupted. Steps that already finished stay done.
    Cancelled(Step),
}

/// External systems a run depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub documents: Arc<dyn DocumentStore>,
    pub parser: Arc<dyn DocumentParser>,
    pub extractor: Arc<dyn ResumeExtractor>,
    pub session_states: Arc<dyn SessionStateStore>,
}

enum Interrupt {
    Failed(StepFailure),
    Cancelled(Step),
}

#[derive(Default)]
struct Progress {
    current: Option<Step>,
    result: PipelineResult,
}

/// Fields of the stored state sent with the `success` event. The parsed text stays server-side.
#[derive(Serialize)]
struct SuccessPayload<'a> {
    session_id: Uuid,
    document_name: Option<&'a str>,
    document_url: Option<&'a str>,
    template_name: Option<&'a str>,
    document_data: Option<&'a ResumeData>,
}

pub struct PipelineWorker {
    collaborators: Collaborators,
    emitter: ProgressEmitter,
    cancel: CancellationToken,
}

impl PipelineWorker {
    pub fn new(
        collaborators: Collaborators,
        emitter: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            collaborators,
            emitter,
            cancel,
        }
    }

    /// Runs every step and reports exactly one terminal event (unless cancelled),
    /// then closes the stream. The close happens on every path, including a panicking
    /// collaborator.
    pub async fn run(self, input: PipelineInput) -> RunOutcome {
        let session_id = input.session_id;
        info!(
            "Pipeline started for session {session_id} ({}, {} bytes)",
            input.file.file_name,
            input.file.bytes.len()
        );

        let mut progress = Progress::default();
        let caught = AssertUnwindSafe(self.execute(&input, &mut progress))
            .catch_unwind()
            .await;
        let executed = caught.unwrap_or_else(|panic| {
            Err(Interrupt::Failed(StepFailure {
                step: progress.current.unwrap_or(Step::Upload),
                error: StepError::Panicked(panic_message(panic.as_ref())),
            }))
        });

        let outcome = match executed {
            Ok(()) => {
                let data = progress.result.stored.as_ref().and_then(success_data);
                self.emitter.emit(EventStatus::Success, data).await;
                info!("Pipeline succeeded for session {session_id}");
                RunOutcome::Succeeded(progress.result)
            }
            Err(Interrupt::Failed(failure)) => {
                error!(
                    "Pipeline failed for session {session_id} at '{}': {}",
                    failure.step, failure.error
                );
                let mut data = Map::new();
                data.insert("error".to_string(), Value::String(failure.public_message()));
                self.emitter.emit(EventStatus::Failed, Some(data)).await;
                RunOutcome::Failed(failure)
            }
            Err(Interrupt::Cancelled(step)) => {
                warn!("Pipeline cancelled for session {session_id} at '{step}'");
                RunOutcome::Cancelled(step)
            }
        };

        self.emitter.close().await;
        outcome
    }

    async fn execute(
        &self,
        input: &PipelineInput,
        progress: &mut Progress,
    ) -> Result<(), Interrupt> {
        let c = &self.collaborators;

        self.begin(Step::Upload, progress).await?;
        let upload = self
            .guarded(Step::Upload, c.documents.upload(&input.file, input.owner_id))
            .await?;

        self.begin(Step::Save, progress).await?;
        let update = SessionStateUpdate {
            document_name: Some(upload.file_name.clone()),
            document_url: Some(upload.file_url.clone()),
            template_name: Some(input.metadata.template_name.clone()),
            job_description: Some(input.metadata.job_description.clone()),
            ..Default::default()
        };
        progress.result.upload = Some(upload);
        let stored = self
            .guarded(Step::Save, c.session_states.save(input.session_id, update))
            .await?;
        progress.result.stored = Some(stored);

        self.begin(Step::Parse, progress).await?;
        let text = self.guarded(Step::Parse, c.parser.parse(&input.file)).await?;
        progress.result.parsed_text = Some(text.clone());

        self.begin(Step::Extract, progress).await?;
        let record = self.guarded(Step::Extract, c.extractor.extract(&text)).await?;
        progress.result.record = Some(record.clone());

        self.begin(Step::Persist, progress).await?;
        let update = SessionStateUpdate {
            document_parsed: Some(text),
            document_data: Some(record),
            ..Default::default()
        };
        let stored = self
            .guarded(Step::Persist, c.session_states.save(input.session_id, update))
            .await?;
        progress.result.stored = Some(stored);

        Ok(())
    }

    /// Stops if cancelled, otherwise announces the step.
    async fn begin(&self, step: Step, progress: &mut Progress) -> Result<(), Interrupt> {
        if self.cancel.is_cancelled() {
            return Err(Interrupt::Cancelled(step));
        }
        progress.current = Some(step);
        if let Some(status) = step.status() {
            self.emitter.emit(status, None).await;
        }
        Ok(())
    }

    /// Runs a collaborator call, abandoning it if the run is cancelled meanwhile.
    async fn guarded<T, E>(
        &self,
        step: Step,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, Interrupt>
    where
        E: Into<StepError>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupt::Cancelled(step)),
            outcome = call => outcome.map_err(|e| {
                Interrupt::Failed(StepFailure {
                    step,
                    error: e.into(),
                })
            }),
        }
    }
}

fn success_data(stored: &SessionState) -> Option<Map<String, Value>> {
    let payload = SuccessPayload {
        session_id: stored.session_id,
        document_name: stored.document_name.as_deref(),
        document_url: stored.document_url.as_deref(),
        template_name: stored.template_name.as_deref(),
        document_data: stored.document_data.as_ref(),
    };
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
