//! AI operations, all of which run on the backend.
//!
//! Nothing here talks to an LLM directly: persona generation and comment
//! drafting are forwarded to backend endpoints that own the provider.

use tracing::info;

use crate::api::{ApiClient, Result};
use crate::model::GeneratedPersona;

/// Reply used when the backend returns no drafting candidates.
pub const NO_DRAFT_FALLBACK: &str = "Unable to generate response.";

/// Thin wrapper over the backend's AI endpoints.
pub struct AiService<'a> {
    api: &'a ApiClient,
}

impl<'a> AiService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Build persona settings (identity and tone) from uploaded documents.
    ///
    /// Proxied through `POST /personas/generate`.
    pub fn generate_persona_config(&self, document_context: &str) -> Result<GeneratedPersona> {
        info!(
            "generating persona from {} bytes of document context",
            document_context.len()
        );
        self.api.generate_persona(document_context)
    }

    /// Draft a reply for a post, following the active voice settings.
    ///
    /// Proxied through `POST /settings/voice/test`; the backend applies the
    /// persona, so `identity` and `rules` only go into the log line.
    pub fn draft_comment(&self, post_context: &str, identity: &str, rules: &[String]) -> Result<String> {
        info!(
            identity_len = identity.len(),
            rules = rules.len(),
            "drafting comment"
        );
        let response = self.api.test_voice(post_context)?;
        Ok(first_candidate_text(response.candidates))
    }
}

fn first_candidate_text(candidates: Vec<crate::model::VoiceTestCandidate>) -> String {
    candidates
        .into_iter()
        .next()
        .map(|c| c.text)
        .unwrap_or_else(|| NO_DRAFT_FALLBACK.to_string())
}
