//! Advisory request/response types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Model label used whenever the heuristic tier produced the advice
pub const HEURISTIC_MODEL_ID: &str = "heuristic-v1";

/// Error tag attached when the generative tier failed and the heuristic stood in
pub const LLM_FAILED_TAG: &str = "llm_failed";

/// Fallback confidence for missing or out-of-range values
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A proposed monthly budget for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetChangeSuggestion {
    pub category_name: String,
    pub target_monthly_amount: f64,
    pub rationale: String,
}

/// Spending advice. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceResult {
    pub insights: Vec<String>,
    pub suggested_budget_changes: Vec<BudgetChangeSuggestion>,
    pub tips: Vec<String>,
    pub follow_ups: Vec<String>,
    pub assumptions: Vec<String>,
    /// Always within [0, 1]
    pub confidence: f64,
}

impl Default for AdviceResult {
    fn default() -> Self {
        Self {
            insights: Vec::new(),
            suggested_budget_changes: Vec::new(),
            tips: Vec::new(),
            follow_ups: Vec::new(),
            assumptions: Vec::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Period the advice was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHints {
    pub month: u32,
    pub year: i32,
}

/// Top-level result of an advisory request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResponse {
    pub model_identifier: String,
    pub advice: AdviceResult,
    pub context_hints: ContextHints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_tag: Option<String>,
}

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryOutcome {
    /// The generative tier produced the advice
    ReturnedGenerative,
    /// No credential configured, heuristic used directly
    ReturnedHeuristicDefault,
    /// Credential configured but generation failed
    ReturnedHeuristicFallback,
}

impl AdvisoryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReturnedGenerative => "returned_generative",
            Self::ReturnedHeuristicDefault => "returned_heuristic_default",
            Self::ReturnedHeuristicFallback => "returned_heuristic_fallback",
        }
    }
}

impl std::fmt::Display for AdvisoryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Privacy preference passed through to the generative tier.
///
/// Recorded with each request; the prompt payload is currently the same in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyMode {
    #[default]
    Standard,
    Strict,
}

impl PrivacyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Strict => "strict",
        }
    }

    /// Lenient conversion from an untyped request field
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => Self::Strict,
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "strict" | "private" | "true" | "on" => Self::Strict,
                _ => Self::Standard,
            },
            _ => Self::Standard,
        }
    }
}

impl std::str::FromStr for PrivacyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("Unknown privacy mode: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for PrivacyMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// Advisory request as received from the HTTP layer.
///
/// Month and year are accepted leniently: numbers and numeric strings are
/// kept, anything else reads as absent and resolves to the current period.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdviceRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub month: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub year: Option<i64>,
    #[serde(default)]
    pub privacy: PrivacyMode,
}

impl AdviceRequest {
    pub fn for_period(month: u32, year: i32) -> Self {
        Self {
            month: Some(month as i64),
            year: Some(year as i64),
            ..Self::default()
        }
    }

    pub fn with_question(mut self, question: &str) -> Self {
        self.question = Some(question.to_string());
        self
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(int_from_value))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
