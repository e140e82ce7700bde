use std::sync::Arc;

use crate::document::{DocumentParser, DocumentStore, ResumeExtractor};
use crate::gateway::worker::Collaborators;
use crate::gateway::GatewaySettings;
use crate::session_state::SessionStateStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every external system is an explicitly constructed handle; nothing is process-global.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub parser: Arc<dyn DocumentParser>,
    pub extractor: Arc<dyn ResumeExtractor>,
    pub session_states: Arc<dyn SessionStateStore>,
    pub gateway: GatewaySettings,
}

impl AppState {
    pub fn pipeline_collaborators(&self) -> Collaborators {
        Collaborators {
            documents: self.documents.clone(),
            parser: self.parser.clone(),
            extractor: self.extractor.clone(),
            session_states: self.session_states.clone(),
        }
    }
}
