//! Prompt construction for the generative advisor
//!
//! The prompt is a fixed template with three variables: the user's question,
//! the schema skeleton the reply must follow, and a JSON payload of the
//! month's rounded figures. Rendering is deterministic for a given input.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::advice::PrivacyMode;
use crate::models::MonthlyContext;

/// Question used when the caller did not ask one
pub const DEFAULT_QUESTION: &str = "How can I improve my budget this month?";

const TEMPLATE: &str = r#"You are a careful personal finance assistant. You review one month of a user's budget data and give practical, specific spending advice.

Respond with a single JSON object and nothing else. Do not wrap it in markdown. Do not add commentary before or after it. Use exactly the keys shown in the schema. Amounts are plain numbers in the category's currency. confidence is a number between 0 and 1.

Question: {{question}}

Schema:
{{schema}}

Data:
{{payload}}
"#;

const SCHEMA: &str = r#"{
  "insights": ["string"],
  "suggestedBudgetChanges": [
    {"categoryName": "string", "targetMonthlyAmount": 0, "rationale": "string"}
  ],
  "tips": ["string"],
  "followUps": ["string"],
  "assumptions": ["string"],
  "confidence": 0.0
}"#;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    month: u32,
    year: i32,
    totals: PayloadTotals,
    categories: Vec<PayloadCategory<'a>>,
    upcoming_bills_count: u32,
    goals: Vec<PayloadGoal<'a>>,
}

#[derive(Serialize)]
struct PayloadTotals {
    income: f64,
    expense: f64,
    balance: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadCategory<'a> {
    name: &'a str,
    spent: f64,
    budget: f64,
    currency: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadGoal<'a> {
    name: &'a str,
    target_amount: f64,
    current_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_date: Option<String>,
}

/// Everything the generative advisor sends for one request
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub context: &'a MonthlyContext,
    pub question: Option<&'a str>,
    /// Carried for logging; the payload is the same in both modes
    pub privacy: PrivacyMode,
}

impl<'a> PromptInput<'a> {
    pub fn new(context: &'a MonthlyContext, question: Option<&'a str>, privacy: PrivacyMode) -> Self {
        Self {
            context,
            question,
            privacy,
        }
    }

    /// Question text, falling back to the default for absent or blank input
    pub fn question(&self) -> &str {
        self.question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUESTION)
    }

    /// Render the full prompt text
    pub fn render(&self) -> String {
        let payload = serde_json::to_string_pretty(&self.payload()).unwrap_or_else(|_| "{}".into());

        let question = self.question();

        // Single pass: substituted text is never scanned for placeholders
        placeholder()
            .replace_all(TEMPLATE, |caps: &Captures| match &caps[1] {
                "question" => question.to_string(),
                "schema" => SCHEMA.to_string(),
                "payload" => payload.clone(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }

    fn payload(&self) -> Payload<'a> {
        let ctx = self.context;
        Payload {
            month: ctx.month,
            year: ctx.year,
            totals: PayloadTotals {
                income: round2(ctx.totals.income),
                expense: round2(ctx.totals.expense),
                balance: round2(ctx.totals.balance),
            },
            categories: ctx
                .expense_by_category
                .iter()
                .map(|e| PayloadCategory {
                    name: &e.category_name,
                    spent: round2(e.spent),
                    budget: round2(e.budget_amount),
                    currency: &e.currency,
                })
                .collect(),
            upcoming_bills_count: ctx.upcoming_bills_count,
            goals: ctx
                .goals
                .iter()
                .map(|g| PayloadGoal {
                    name: &g.name,
                    target_amount: round2(g.target_amount),
                    current_amount: round2(g.current_amount),
                    target_date: g.target_date.map(|d| d.format("%Y-%m-%d").to_string()),
                })
                .collect(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
