use async_trait::async_trait;
use tracing::debug;

use crate::document::prompts::{RESUME_EXTRACT_PROMPT, RESUME_EXTRACT_SYSTEM};
use crate::document::{DocumentError, ResumeExtractor};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::resume::ResumeData;

/// Extracts `ResumeData` from plain text with a single LLM call.
#[derive(Clone)]
pub struct LlmResumeExtractor {
    llm: LlmClient,
}

impl LlmResumeExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

fn classify(e: LlmError) -> DocumentError {
    if e.is_upstream() {
        DocumentError::ModelUnavailable(e.to_string())
    } else {
        DocumentError::MalformedOutput(e.to_string())
    }
}

#[async_trait]
impl ResumeExtractor for LlmResumeExtractor {
    async fn extract(&self, text: &str) -> Result<ResumeData, DocumentError> {
        let prompt = RESUME_EXTRACT_PROMPT.replace("{resume_text}", text);
        let system = format!("{RESUME_EXTRACT_SYSTEM} {JSON_ONLY_SYSTEM}");

        let data: ResumeData = self
            .llm
            .call_json(&prompt, &system)
            .await
            .map_err(classify)?;

        debug!(
            "Extracted resume: {} experience, {} education, {} skill categories",
            data.experience.len(),
            data.education.len(),
            data.skills.len()
        );
        Ok(data)
    }
}
