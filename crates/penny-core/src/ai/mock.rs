//! Mock backend for testing
//!
//! Returns a scripted reply (or failure) for every call, optionally after a
//! delay. Useful for exercising the fallback paths without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// Well-formed advice reply used by `MockBackend::new`
pub const MOCK_ADVICE_REPLY: &str = r#"Here is my analysis:
{
  "insights": ["Dining is well over budget this month."],
  "suggestedBudgetChanges": [
    {"categoryName": "Dining", "targetMonthlyAmount": 220, "rationale": "Bring dining closer to plan."}
  ],
  "tips": ["Cook at home two more nights a week."],
  "followUps": ["Were any dining expenses for special occasions?"],
  "assumptions": ["Figures cover posted transactions only."],
  "confidence": 0.8
}"#;

#[derive(Clone, Debug)]
enum Reply {
    Text(String),
    Fail(String),
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    reply: Reply,
    delay: Option<Duration>,
    model: String,
    calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Mock that answers with well-formed advice JSON wrapped in prose
    pub fn new() -> Self {
        Self::replying(MOCK_ADVICE_REPLY)
    }

    /// Mock that answers every call with the given text
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Reply::Text(text.to_string()),
            delay: None,
            model: "mock-model".to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Mock whose every call fails with a generation error
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Reply::Fail(message.to_string()),
            ..Self::new()
        }
    }

    /// Delay each reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of generation calls made so far (shared across clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt of the most recent call
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(Error::Generation(message.clone())),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock"
    }
}
