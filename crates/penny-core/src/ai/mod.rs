//! Text-generation backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: a single raw text-generation call
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `HuggingFaceBackend`, `MockBackend`
//! - `GenerativeAdvisor`: prompt, invoke, extract and normalize, with an
//!   explicit `GenerationOutcome` instead of errors for the caller to match
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = AdvisorConfig::resolve(None)?;
//!
//! // None when no credential is configured
//! if let Some(client) = AIClient::from_config(&config) {
//!     let text = client.generate_text("Say hello").await?;
//! }
//! ```

mod generative;
mod huggingface;
mod mock;
pub mod parsing;
pub mod prompt;

pub use generative::{GenerationOutcome, GenerativeAdvisor};
pub use huggingface::HuggingFaceBackend;
pub use mock::MockBackend;
pub use prompt::PromptInput;

use async_trait::async_trait;

use crate::config::AdvisorConfig;
use crate::error::Result;

/// Trait defining the interface for text-generation backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Generate text for a prompt, returning the normalized generated string
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Model identifier this backend sends requests for
    fn model(&self) -> &str;

    /// Endpoint or label identifying where requests go
    fn host(&self) -> &str;
}

/// Concrete AI client wrapper
///
/// Provides Clone and static dispatch over the available backends.
#[derive(Clone)]
pub enum AIClient {
    HuggingFace(HuggingFaceBackend),
    Mock(MockBackend),
}

impl AIClient {
    /// Build a client from resolved configuration.
    ///
    /// Returns None when no credential is configured; the generative tier is
    /// disabled in that case.
    pub fn from_config(config: &AdvisorConfig) -> Option<Self> {
        if !config.has_credential() {
            return None;
        }
        let token = config.credential.as_deref()?.trim();
        Some(AIClient::HuggingFace(HuggingFaceBackend::new(
            &config.host,
            &config.model,
            token,
            config.params.clone(),
        )))
    }

    /// Create a mock client for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::HuggingFace(_) => "huggingface",
            AIClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::HuggingFace(b) => b.generate_text(prompt).await,
            AIClient::Mock(b) => b.generate_text(prompt).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::HuggingFace(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::HuggingFace(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
