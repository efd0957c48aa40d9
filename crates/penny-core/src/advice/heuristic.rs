//! Heuristic advice generator
//!
//! Deterministic, rule-based advice that needs no external service. It is the
//! guaranteed fallback for the generative tier, so every rule here must be
//! explainable from the numbers in the `MonthlyContext` alone.
//!
//! Ranking: each category gets a ratio of spend to budget (2.0 for spending
//! with no budget at all), categories are stably sorted by ratio, and only the
//! top three are examined. Categories without spend are skipped after the cut,
//! so fewer than three suggestions can come back even when more categories
//! overspent.

use std::cmp::Ordering;

use crate::models::{CategorySpendEntry, MonthlyContext};

use super::types::{AdviceResult, BudgetChangeSuggestion};

/// Confidence reported for heuristic advice
pub const HEURISTIC_CONFIDENCE: f64 = 0.6;

/// Ratio assigned to categories with spending but no budget
const UNBUDGETED_RATIO: f64 = 2.0;

const TIPS: [&str; 3] = [
    "Schedule fixed bills right after payday so they never compete with day-to-day spending.",
    "Move discretionary purchases into categories that have a monthly cap.",
    "Review recurring charges and subscriptions once a month and cancel the ones you no longer use.",
];

const FOLLOW_UPS: [&str; 2] = [
    "Which of these categories are essential for you, and which could flex?",
    "Are any large expenses this month one-offs that will not repeat?",
];

const ASSUMPTIONS: [&str; 2] = [
    "Advice is based on monthly category totals only, not individual transactions.",
    "Categories are not labeled as essential or discretionary, so all spending is treated alike.",
];

/// A category with its computed ranking signals
#[derive(Debug, Clone)]
struct RankedEntry<'a> {
    entry: &'a CategorySpendEntry,
    ratio: f64,
    /// Amount over (positive) or under budget
    delta: f64,
}

impl<'a> RankedEntry<'a> {
    fn new(entry: &'a CategorySpendEntry) -> Self {
        let ratio = if entry.budget_amount > 0.0 {
            entry.spent / entry.budget_amount
        } else if entry.spent > 0.0 {
            UNBUDGETED_RATIO
        } else {
            0.0
        };

        Self {
            entry,
            ratio,
            delta: entry.spent - entry.budget_amount,
        }
    }
}

/// Rule-based advisor
pub struct HeuristicAdvisor {
    /// Number of top-ranked categories examined (default 3)
    max_ranked: usize,
    /// Multiplier applied to an overspent budget (default 0.9, a 10% cut)
    overspend_cut: f64,
    /// Multiplier applied to unbudgeted spend (default 0.8)
    unbudgeted_cap: f64,
}

impl Default for HeuristicAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicAdvisor {
    pub fn new() -> Self {
        Self {
            max_ranked: 3,
            overspend_cut: 0.9,
            unbudgeted_cap: 0.8,
        }
    }

    /// Produce advice for a month. Never fails.
    ///
    /// The question is accepted for signature parity with the generative
    /// tier; the rules do not depend on it.
    pub fn generate(&self, ctx: &MonthlyContext, _question: Option<&str>) -> AdviceResult {
        let mut ranked: Vec<RankedEntry> = ctx
            .expense_by_category
            .iter()
            .map(RankedEntry::new)
            .collect();

        // Stable: ties keep declaration order
        ranked.sort_by(|a, b| b.ratio.partial_cmp(&a.ratio).unwrap_or(Ordering::Equal));

        let mut insights = vec![totals_insight(ctx)];
        let mut suggestions = Vec::new();

        for item in ranked.iter().take(self.max_ranked) {
            let entry = item.entry;
            if entry.spent <= 0.0 {
                continue;
            }

            insights.push(category_insight(entry, item.ratio));

            if entry.budget_amount > 0.0 && entry.spent > entry.budget_amount {
                suggestions.push(BudgetChangeSuggestion {
                    category_name: entry.category_name.clone(),
                    target_monthly_amount: (entry.budget_amount * self.overspend_cut).round(),
                    rationale: format!(
                        "Spent {} against a budget of {}, {} over ({}% of budget). A 10% lower target pulls spending back toward plan.",
                        money(entry.spent, &entry.currency),
                        money(entry.budget_amount, &entry.currency),
                        money(item.delta, &entry.currency),
                        percent(item.ratio)
                    ),
                });
            } else if entry.budget_amount == 0.0 {
                suggestions.push(BudgetChangeSuggestion {
                    category_name: entry.category_name.clone(),
                    target_monthly_amount: (entry.spent * self.unbudgeted_cap).round(),
                    rationale: format!(
                        "No budget was set for this category and {} was spent. Capping it at 80% of that spend sets a first limit.",
                        money(entry.spent, &entry.currency)
                    ),
                });
            }
        }

        if ctx.upcoming_bills_count > 0 {
            insights.push(format!(
                "{} upcoming bill{} still due this month.",
                ctx.upcoming_bills_count,
                if ctx.upcoming_bills_count == 1 { " is" } else { "s are" }
            ));
        }

        for goal in ctx.goals.iter().filter(|g| g.target_amount > 0.0) {
            let mut line = format!(
                "Goal \"{}\": {:.2} of {:.2} saved ({}%)",
                goal.name,
                goal.current_amount,
                goal.target_amount,
                percent(goal.current_amount / goal.target_amount)
            );
            if let Some(date) = goal.target_date {
                line.push_str(&format!(", target date {}", date.format("%Y-%m-%d")));
            }
            line.push('.');
            insights.push(line);
        }

        AdviceResult {
            insights,
            suggested_budget_changes: suggestions,
            tips: TIPS.iter().map(|s| s.to_string()).collect(),
            follow_ups: FOLLOW_UPS.iter().map(|s| s.to_string()).collect(),
            assumptions: ASSUMPTIONS.iter().map(|s| s.to_string()).collect(),
            confidence: HEURISTIC_CONFIDENCE,
        }
    }
}

fn totals_insight(ctx: &MonthlyContext) -> String {
    format!(
        "In {:04}-{:02} income was {:.2} and expenses were {:.2}, leaving a balance of {:.2}.",
        ctx.year, ctx.month, ctx.totals.income, ctx.totals.expense, ctx.totals.balance
    )
}

fn category_insight(entry: &CategorySpendEntry, ratio: f64) -> String {
    if entry.budget_amount > 0.0 {
        format!(
            "{}: spent {} of a {} budget ({}%).",
            entry.category_name,
            money(entry.spent, &entry.currency),
            money(entry.budget_amount, &entry.currency),
            percent(ratio)
        )
    } else {
        format!(
            "{}: spent {} with no budget set.",
            entry.category_name,
            money(entry.spent, &entry.currency)
        )
    }
}

fn money(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}
