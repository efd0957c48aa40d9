//! Parsing helpers for text-generation responses
//!
//! Model output is untrusted free text. These functions pull a JSON value out
//! of it and rebuild an `AdviceResult` field by field, so a malformed reply
//! can only ever degrade to defaults, never to a malformed result.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::advice::{AdviceResult, BudgetChangeSuggestion, DEFAULT_CONFIDENCE};

/// Maximum characters of a raw body kept in error messages
const MAX_RAW_LEN: usize = 200;

fn json_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Leftmost match, greedy: first `{` to last `}` (or `[` to `]`)
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}|\[[\s\S]*\]").expect("valid regex"))
}

/// Truncate a raw body for error messages and logs
pub fn truncate_raw(raw: &str) -> String {
    if raw.chars().count() > MAX_RAW_LEN {
        format!("{}...", raw.chars().take(MAX_RAW_LEN).collect::<String>())
    } else {
        raw.to_string()
    }
}

/// Normalize a provider response body to the generated text.
///
/// Accepts `[{"generated_text": ...}]`, `{"generated_text": ...}`, a JSON
/// string, or a body that is not JSON at all (returned as-is). Any other
/// JSON envelope, such as `{"error": ...}`, yields no text.
pub fn extract_generated_text(body: &str) -> String {
    let value: Value = match serde_json::from_str(body.trim()) {
        Ok(v) => v,
        Err(_) => return body.to_string(),
    };

    match &value {
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Object(map) => map
            .get("generated_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::String(text) => text.clone(),
        _ => body.to_string(),
    }
}

/// Find a JSON value in generated text.
///
/// The whole trimmed text is parsed when it starts with `{` or `[`;
/// otherwise the first `{...}` or `[...]` span is tried. Returns None when
/// neither parses.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Some(value);
        }
    }

    let span = json_span().find(trimmed)?;
    serde_json::from_str(span.as_str()).ok()
}

/// Extract and normalize advice from generated text.
///
/// Only a JSON object counts as usable output; arrays, scalars and text
/// without JSON return None.
pub fn parse_advice(text: &str) -> Option<AdviceResult> {
    match extract_json(text)? {
        value @ Value::Object(_) => Some(normalize_advice(&value)),
        _ => None,
    }
}

/// Rebuild an `AdviceResult` from an untrusted JSON value.
///
/// Missing or wrongly-typed fields fall back to defaults. Applying this to
/// its own serialized output returns the same result.
pub fn normalize_advice(value: &Value) -> AdviceResult {
    AdviceResult {
        insights: string_list(value.get("insights")),
        suggested_budget_changes: suggestions(value.get("suggestedBudgetChanges")),
        tips: string_list(value.get("tips")),
        follow_ups: string_list(value.get("followUps")),
        assumptions: string_list(value.get("assumptions")),
        confidence: confidence(value.get("confidence")),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn suggestions(value: Option<&Value>) -> Vec<BudgetChangeSuggestion> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| BudgetChangeSuggestion {
            category_name: text_field(item.get("categoryName")),
            target_monthly_amount: amount_field(item.get("targetMonthlyAmount")),
            rationale: text_field(item.get("rationale")),
        })
        .collect()
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn amount_field(value: Option<&Value>) -> f64 {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => a,
        _ => 0.0,
    }
}

fn confidence(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(c) if (0.0..=1.0).contains(&c) => c,
        _ => DEFAULT_CONFIDENCE,
    }
}
