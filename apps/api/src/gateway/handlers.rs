use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::document::handlers::FormData;
use crate::errors::AppError;
use crate::gateway::channel::event_channel;
use crate::gateway::emitter::ProgressEmitter;
use crate::gateway::models::{PipelineInput, ProcessInput};
use crate::gateway::stream::StreamAdapter;
use crate::gateway::worker::PipelineWorker;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProcessInputQuery {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

/// POST /api/v1/gateway/process-input-data
///
/// Multipart `file` + `template_name` + `job_description`. Responds immediately with a
/// `text/event-stream` of progress events while the pipeline runs in its own task.
pub async fn handle_process_input_data(
    State(state): State<AppState>,
    Query(params): Query<ProcessInputQuery>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormData::read(multipart).await?;
    let input = PipelineInput {
        file: form.take_file()?,
        metadata: ProcessInput {
            template_name: form.take_text("template_name")?,
            job_description: form.take_text("job_description")?,
        },
        owner_id: params.user_id,
        session_id: params.session_id,
    };
    Ok(start_pipeline(&state, input))
}

/// Wires a fresh channel, emitter and worker for one run and returns the streaming response.
pub fn start_pipeline(state: &AppState, input: PipelineInput) -> Response {
    let settings = state.gateway;
    let (sender, receiver) = event_channel(settings.channel_capacity);
    let cancel = CancellationToken::new();

    let worker = PipelineWorker::new(
        state.pipeline_collaborators(),
        ProgressEmitter::new(sender),
        cancel.clone(),
    );
    tokio::spawn(worker.run(input));

    let adapter = StreamAdapter::new(receiver, settings.read_timeout, cancel);
    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        adapter.into_sse(),
    )
        .into_response()
}
