//! Compliance review of a draft. Critique only, never a rewrite.

use crate::error::WizardError;
use crate::llm::ChatModel;
use crate::prompts::{review_user_message, EMPTY_REVIEW_PLACEHOLDER, REVIEW_SYSTEM_PROMPT};
use crate::types::ReviewReport;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Body of a review request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub markdown: String,
    /// Source facts for fact-checking, either as a JSON string or inline.
    #[serde(default)]
    pub extracted_json: Option<Value>,
}

impl ReviewRequest {
    fn facts_text(&self) -> Option<String> {
        match self.extracted_json.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => serde_json::to_string_pretty(other).ok(),
        }
    }
}

pub async fn review(
    model: &dyn ChatModel,
    req: &ReviewRequest,
    max_tokens: usize,
) -> Result<ReviewReport, WizardError> {
    if req.markdown.trim().is_empty() {
        return Err(WizardError::invalid_input("markdown is required"));
    }
    let facts = req.facts_text();
    let user = review_user_message(&req.markdown, facts.as_deref());

    info!(
        "Reviewing draft: {} chars, facts {}",
        req.markdown.len(),
        if facts.is_some() { "attached" } else { "absent" }
    );
    let reply = model
        .complete(REVIEW_SYSTEM_PROMPT, &user, max_tokens)
        .await?;
    let report = match reply.trim() {
        "" => EMPTY_REVIEW_PLACEHOLDER.to_string(),
        text => text.to_string(),
    };
    Ok(ReviewReport { report })
}
