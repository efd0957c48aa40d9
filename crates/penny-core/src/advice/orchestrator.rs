//! Advisory orchestrator
//!
//! Picks the generator tier for each request and owns fallback:
//!
//! 1. Resolve the period (defaults to the current month)
//! 2. Build the monthly context; a failure here is the only error returned
//! 3. Without a credential, answer with heuristic advice
//! 4. With a credential, try generative advice; on any failure or unusable
//!    output, answer with heuristic advice over the same context and tag the
//!    response with `llm_failed`

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{info, warn};

use crate::ai::{AIBackend, AIClient, GenerationOutcome, GenerativeAdvisor};
use crate::config::AdvisorConfig;
use crate::context::ContextAggregator;
use crate::error::Result;
use crate::store::RecordStore;

use super::heuristic::HeuristicAdvisor;
use super::types::{
    AdviceRequest, AdvisoryOutcome, AdvisoryResponse, ContextHints, HEURISTIC_MODEL_ID,
    LLM_FAILED_TAG,
};

/// Entry point for spending advice
pub struct BudgetAdvisor {
    aggregator: ContextAggregator,
    heuristic: HeuristicAdvisor,
    generative: Option<GenerativeAdvisor>,
    model: String,
}

impl BudgetAdvisor {
    /// Create an advisor.
    ///
    /// The generative tier is enabled only when `config` carries a
    /// credential. `client` overrides the backend built from `config`.
    pub fn new(store: Arc<dyn RecordStore>, config: &AdvisorConfig, client: Option<AIClient>) -> Self {
        let generative = if config.has_credential() {
            client
                .or_else(|| AIClient::from_config(config))
                .map(|c| GenerativeAdvisor::new(c, config.timeout))
        } else {
            None
        };

        Self {
            aggregator: ContextAggregator::new(store),
            heuristic: HeuristicAdvisor::new(),
            generative,
            model: config.model.clone(),
        }
    }

    /// Create an advisor with the backend described by `config`
    pub fn from_config(store: Arc<dyn RecordStore>, config: &AdvisorConfig) -> Self {
        Self::new(store, config, None)
    }

    /// Whether requests will try the generative tier first
    pub fn generative_enabled(&self) -> bool {
        self.generative.is_some()
    }

    /// Get spending advice for a user.
    ///
    /// Only record-store failures are returned as errors; generation
    /// problems degrade to heuristic advice.
    pub async fn get_budget_advice(
        &self,
        user_id: &str,
        request: AdviceRequest,
    ) -> Result<AdvisoryResponse> {
        let (response, _) = self.advise(user_id, request).await?;
        Ok(response)
    }

    /// Like `get_budget_advice`, also reporting how the request ended
    pub async fn advise(
        &self,
        user_id: &str,
        request: AdviceRequest,
    ) -> Result<(AdvisoryResponse, AdvisoryOutcome)> {
        let (month, year) = resolve_period(&request, Local::now().date_naive());
        let ctx = self.aggregator.build_context(user_id, month, year).await?;
        let question = request.question.as_deref();
        let context_hints = ContextHints { month, year };

        let Some(generative) = &self.generative else {
            let outcome = AdvisoryOutcome::ReturnedHeuristicDefault;
            info!(user_id, month, year, outcome = %outcome, "Advice ready");
            return Ok((
                AdvisoryResponse {
                    model_identifier: HEURISTIC_MODEL_ID.to_string(),
                    advice: self.heuristic.generate(&ctx, question),
                    context_hints,
                    error_tag: None,
                },
                outcome,
            ));
        };

        let (response, outcome) = match generative.generate(&ctx, question, request.privacy).await {
            GenerationOutcome::Generated(advice) => (
                AdvisoryResponse {
                    model_identifier: self.model.clone(),
                    advice,
                    context_hints,
                    error_tag: None,
                },
                AdvisoryOutcome::ReturnedGenerative,
            ),
            failure => {
                let model = generative.client().model();
                match &failure {
                    GenerationOutcome::Failed(e) => {
                        warn!(model, error = %e, "Falling back to heuristic advice")
                    }
                    _ => warn!(model, "Unusable generated output, falling back to heuristic advice"),
                }
                (
                    AdvisoryResponse {
                        model_identifier: HEURISTIC_MODEL_ID.to_string(),
                        advice: self.heuristic.generate(&ctx, question),
                        context_hints,
                        error_tag: Some(LLM_FAILED_TAG.to_string()),
                    },
                    AdvisoryOutcome::ReturnedHeuristicFallback,
                )
            }
        };

        info!(user_id, month, year, outcome = %outcome, "Advice ready");
        Ok((response, outcome))
    }
}

/// Month and year for a request, defaulting each to `today`'s.
///
/// Values outside 1..=12 (month) or 1..=9999 (year) count as absent.
pub fn resolve_period(request: &AdviceRequest, today: NaiveDate) -> (u32, i32) {
    let month = request
        .month
        .filter(|m| (1..=12).contains(m))
        .map(|m| m as u32)
        .unwrap_or_else(|| today.month());
    let year = request
        .year
        .filter(|y| (1..=9999).contains(y))
        .map(|y| y as i32)
        .unwrap_or_else(|| today.year());
    (month, year)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ai::MockBackend;
    use crate::models::{BudgetProgress, Overview};
    use crate::store::{InMemoryStore, StoreOperation};
    use crate::test_utils::{advice_reply, MockInferenceServer, MockResponse, MOCK_TOKEN};

    const USER: &str = "u1";

    fn store() -> InMemoryStore {
        InMemoryStore::new()
            .with_overview(
                USER,
                3,
                2026,
                Overview {
                    income: 4000.0,
                    expense: 310.0,
                    balance: 3690.0,
                    upcoming_bills_count: 1,
                },
            )
            .with_category(USER, 1, "Utilities")
            .with_category(USER, 2, "Dining")
            .with_progress(
                USER,
                1,
                3,
                2026,
                BudgetProgress {
                    spent: 10.0,
                    budget_amount: Some(500.0),
                    currency: None,
                },
            )
            .with_progress(
                USER,
                2,
                3,
                2026,
                BudgetProgress {
                    spent: 300.0,
                    budget_amount: Some(200.0),
                    currency: None,
                },
            )
    }

    fn advisor(config: &AdvisorConfig, mock: Option<MockBackend>) -> BudgetAdvisor {
        BudgetAdvisor::new(Arc::new(store()), config, mock.map(AIClient::Mock))
    }

    fn credentialed() -> AdvisorConfig {
        AdvisorConfig::default().with_credential("hf_test")
    }

    fn march() -> AdviceRequest {
        AdviceRequest::for_period(3, 2026)
    }

    #[test]
    fn test_resolve_period() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(resolve_period(&AdviceRequest::default(), today), (10, 2026));
        assert_eq!(resolve_period(&march(), today), (3, 2026));

        let req = AdviceRequest {
            month: Some(13),
            year: Some(0),
            ..AdviceRequest::default()
        };
        assert_eq!(resolve_period(&req, today), (10, 2026));
    }

    #[tokio::test]
    async fn test_no_credential_uses_heuristic() {
        // Client is ignored without a credential
        let mock = MockBackend::new();
        let advisor = advisor(&AdvisorConfig::default(), Some(mock.clone()));
        assert!(!advisor.generative_enabled());

        let (response, outcome) = advisor.advise(USER, march()).await.unwrap();
        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicDefault);
        assert_eq!(response.model_identifier, "heuristic-v1");
        assert_eq!(response.error_tag, None);
        assert_eq!(response.context_hints, ContextHints { month: 3, year: 2026 });
        assert_eq!(response.advice.confidence, 0.6);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_credential_uses_heuristic() {
        let mock = MockBackend::new();
        let advisor = advisor(&AdvisorConfig::default().with_credential("  "), Some(mock.clone()));
        assert!(!advisor.generative_enabled());

        let (_, outcome) = advisor.advise(USER, march()).await.unwrap();
        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicDefault);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_heuristic_scenario() {
        let response = advisor(&AdvisorConfig::default(), None)
            .get_budget_advice(USER, march())
            .await
            .unwrap();

        let suggestions = &response.advice.suggested_budget_changes;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].category_name, "Dining");
        assert_eq!(suggestions[0].target_monthly_amount, 180.0);
    }

    #[tokio::test]
    async fn test_generative_success() {
        let mock = MockBackend::new();
        let (response, outcome) = advisor(&credentialed(), Some(mock.clone()))
            .advise(USER, march().with_question("Where can I save?"))
            .await
            .unwrap();

        assert_eq!(outcome, AdvisoryOutcome::ReturnedGenerative);
        assert_eq!(response.model_identifier, crate::config::DEFAULT_MODEL);
        assert_eq!(response.error_tag, None);
        assert_eq!(response.advice.confidence, 0.8);
        assert_eq!(mock.call_count(), 1);
        assert!(mock.last_prompt().unwrap().contains("\"Dining\""));
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let (response, outcome) = advisor(&credentialed(), Some(MockBackend::failing("boom")))
            .advise(USER, march())
            .await
            .unwrap();

        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicFallback);
        assert_eq!(response.model_identifier, "heuristic-v1");
        assert_eq!(response.error_tag.as_deref(), Some("llm_failed"));
        assert_eq!(response.advice.suggested_budget_changes[0].target_monthly_amount, 180.0);
    }

    #[tokio::test]
    async fn test_garbage_output_falls_back() {
        let (response, outcome) = advisor(&credentialed(), Some(MockBackend::replying("no json here")))
            .advise(USER, march())
            .await
            .unwrap();

        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicFallback);
        assert_eq!(response.error_tag.as_deref(), Some("llm_failed"));
        assert_eq!(response.advice.confidence, 0.6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let mock = MockBackend::new().with_delay(Duration::from_secs(60));
        let (response, outcome) = advisor(&credentialed(), Some(mock))
            .advise(USER, march())
            .await
            .unwrap();

        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicFallback);
        assert_eq!(response.error_tag.as_deref(), Some("llm_failed"));
    }

    async fn advise_over_http(
        response: MockResponse,
        timeout: Duration,
    ) -> (AdvisoryResponse, AdvisoryOutcome, MockInferenceServer) {
        let server = MockInferenceServer::start(response).await;
        let mut config = AdvisorConfig::default().with_credential(MOCK_TOKEN);
        config.host = server.url();
        config.timeout = timeout;

        let advisor = BudgetAdvisor::from_config(Arc::new(store()), &config);
        let (response, outcome) = advisor.advise(USER, march()).await.unwrap();
        (response, outcome, server)
    }

    #[tokio::test]
    async fn test_http_generative_success() {
        let (response, outcome, server) =
            advise_over_http(MockResponse::Array(advice_reply()), Duration::from_secs(5)).await;

        assert_eq!(outcome, AdvisoryOutcome::ReturnedGenerative);
        assert_eq!(response.model_identifier, crate::config::DEFAULT_MODEL);
        assert_eq!(response.advice.confidence, 0.72);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["parameters"]["return_full_text"], false);
        assert!(requests[0]["inputs"].as_str().unwrap().contains("Utilities"));
    }

    #[tokio::test]
    async fn test_http_failures_fall_back() {
        for response in [MockResponse::Garbage, MockResponse::ServerError] {
            let (response, outcome, server) =
                advise_over_http(response, Duration::from_secs(5)).await;
            assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicFallback);
            assert_eq!(response.error_tag.as_deref(), Some("llm_failed"));
            // No retries
            assert_eq!(server.requests().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_http_provider_envelope_falls_back() {
        let envelope = serde_json::json!({"error": "Model is loading", "estimated_time": 20});
        let (response, outcome, _server) =
            advise_over_http(MockResponse::Envelope(envelope), Duration::from_secs(5)).await;

        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicFallback);
        assert_eq!(response.model_identifier, "heuristic-v1");
        assert_eq!(response.error_tag.as_deref(), Some("llm_failed"));
        assert_eq!(response.advice.suggested_budget_changes[0].category_name, "Dining");
    }

    #[tokio::test]
    async fn test_http_slow_provider_times_out() {
        let (response, outcome, _server) = advise_over_http(
            MockResponse::Slow(Duration::from_secs(3), advice_reply()),
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(outcome, AdvisoryOutcome::ReturnedHeuristicFallback);
        assert_eq!(response.model_identifier, "heuristic-v1");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = store().failing(StoreOperation::BudgetProgress);
        let mock = MockBackend::new();
        let advisor = BudgetAdvisor::new(
            Arc::new(store),
            &credentialed(),
            Some(AIClient::Mock(mock.clone())),
        );

        let err = advisor.get_budget_advice(USER, march()).await.unwrap_err();
        assert!(err.is_data_access());
        assert_eq!(mock.call_count(), 0);
    }
}
