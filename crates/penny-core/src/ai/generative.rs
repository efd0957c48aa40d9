//! Generative advice adapter
//!
//! One bounded call to the text-generation backend, then JSON extraction and
//! field-by-field normalization. Nothing here returns an error to the caller:
//! every way the call can go wrong becomes a `GenerationOutcome` variant that
//! the orchestrator matches on to decide whether to fall back.

use std::time::Duration;

use tracing::{debug, warn};

use crate::advice::{AdviceResult, PrivacyMode};
use crate::error::Error;
use crate::models::MonthlyContext;

use super::parsing::{parse_advice, truncate_raw};
use super::prompt::PromptInput;
use super::{AIBackend, AIClient};

/// Result of one generative attempt
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Output parsed and normalized into advice
    Generated(AdviceResult),
    /// The call succeeded but no JSON object could be recovered from it
    Unusable { raw: String },
    /// Network failure, non-2xx status or timeout
    Failed(Error),
}

/// Prompt, invoke, extract, normalize
#[derive(Clone)]
pub struct GenerativeAdvisor {
    client: AIClient,
    timeout: Duration,
}

impl GenerativeAdvisor {
    pub fn new(client: AIClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    /// Attempt generative advice for a month
    pub async fn generate(
        &self,
        ctx: &MonthlyContext,
        question: Option<&str>,
        privacy: PrivacyMode,
    ) -> GenerationOutcome {
        let input = PromptInput::new(ctx, question, privacy);
        let prompt = input.render();

        debug!(
            model = %self.client.model(),
            host = %self.client.host(),
            backend = self.client.backend_name(),
            privacy = input.privacy.as_str(),
            categories = ctx.expense_by_category.len(),
            prompt_len = prompt.len(),
            "Requesting generative advice"
        );

        let text = match tokio::time::timeout(self.timeout, self.client.generate_text(&prompt)).await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(host = %self.client.host(), error = %e, "Generation request failed");
                return GenerationOutcome::Failed(e);
            }
            Err(_) => {
                let secs = self.timeout.as_secs();
                warn!(timeout_secs = secs, "Generation request timed out");
                return GenerationOutcome::Failed(Error::Timeout(secs));
            }
        };

        match parse_advice(&text) {
            Some(advice) => GenerationOutcome::Generated(advice),
            None => {
                warn!(raw = %truncate_raw(&text), "No usable JSON in generated text");
                GenerationOutcome::Unusable { raw: text }
            }
        }
    }
}
