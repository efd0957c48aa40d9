//! Hosted inference backend
//!
//! Talks to a HuggingFace-style text-generation endpoint:
//! `POST {host}/models/{model}` with a bearer token and a body of
//! `{inputs, parameters}`. The reply may be `[{"generated_text": ...}]`,
//! `{"generated_text": ...}` or a bare string; all three are normalized to
//! one string.
//!
//! The call is made exactly once. Timeouts are applied by the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::GenerationParams;
use crate::error::{Error, Result};

use super::parsing::{extract_generated_text, truncate_raw};
use super::AIBackend;

/// Text-generation backend for a hosted inference API
#[derive(Clone)]
pub struct HuggingFaceBackend {
    http_client: Client,
    base_url: String,
    model: String,
    token: String,
    params: GenerationParams,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_full_text: bool,
}

impl HuggingFaceBackend {
    /// Create a new backend
    pub fn new(base_url: &str, model: &str, token: &str, params: GenerationParams) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token: token.to_string(),
            params,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    fn request_body<'a>(&self, prompt: &'a str) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: self.params.max_new_tokens,
                temperature: self.params.temperature,
                top_p: self.params.top_p,
                return_full_text: false,
            },
        }
    }
}

#[async_trait]
impl AIBackend for HuggingFaceBackend {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        debug!(model = %self.model, prompt_len = prompt.len(), "Sending generation request");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Generation(format!(
                "Inference API error {}: {}",
                status,
                truncate_raw(&body)
            )));
        }

        debug!(status = %status, body_len = body.len(), "Generation response received");
        Ok(extract_generated_text(&body))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
