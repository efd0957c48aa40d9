//! Monthly context aggregator
//!
//! Builds the `MonthlyContext` snapshot the advisors work from. The four
//! independent reads (overview, categories, budgets, goals) run concurrently,
//! then budget progress is fetched for every category concurrently. Output
//! keeps category declaration order regardless of completion order.
//!
//! Any failed read fails the whole aggregation; no partial context is ever
//! returned.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    non_negative, Budget, BudgetProgress, CategorySpendEntry, ExpenseCategory, Goal, GoalSummary,
    MonthlyContext, Totals, DEFAULT_CURRENCY,
};
use crate::store::RecordStore;

/// Builds monthly contexts from a record store
#[derive(Clone)]
pub struct ContextAggregator {
    store: Arc<dyn RecordStore>,
}

impl ContextAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Build the context for one user and month
    pub async fn build_context(
        &self,
        user_id: &str,
        month: u32,
        year: i32,
    ) -> Result<MonthlyContext> {
        let store = self.store.as_ref();

        let (overview, categories, budgets, goals) = tokio::try_join!(
            store.get_overview(user_id, month, year),
            store.list_expense_categories(user_id),
            store.list_budgets(user_id, month, year),
            store.list_goals(user_id),
        )
        .map_err(into_data_access)?;

        let categories = dedupe_categories(categories);

        let progress = try_join_all(
            categories
                .iter()
                .map(|c| store.get_budget_progress(user_id, c.id, month, year)),
        )
        .await
        .map_err(into_data_access)?;

        let budgets_by_category = index_budgets(&budgets);

        let expense_by_category: Vec<CategorySpendEntry> = categories
            .into_iter()
            .zip(progress)
            .map(|(category, progress)| {
                let budget = budgets_by_category.get(&category.id).copied();
                spend_entry(category, progress, budget)
            })
            .collect();

        let goals: Vec<GoalSummary> = goals.into_iter().map(summarize_goal).collect();

        debug!(
            user_id,
            month,
            year,
            categories = expense_by_category.len(),
            budgets = budgets.len(),
            goals = goals.len(),
            "Monthly context assembled"
        );

        Ok(MonthlyContext {
            month,
            year,
            totals: Totals::new(overview.income, overview.expense),
            expense_by_category,
            upcoming_bills_count: u32::try_from(overview.upcoming_bills_count.max(0))
                .unwrap_or(u32::MAX),
            goals,
        })
    }
}

/// Any failure while reading records surfaces as a data-access error
fn into_data_access(e: Error) -> Error {
    if e.is_data_access() {
        e
    } else {
        Error::DataAccess(e.to_string())
    }
}

/// Keep the first occurrence of each category id
fn dedupe_categories(categories: Vec<ExpenseCategory>) -> Vec<ExpenseCategory> {
    let mut seen = HashSet::new();
    categories
        .into_iter()
        .filter(|c| seen.insert(c.id))
        .collect()
}

/// First budget row per category
fn index_budgets(budgets: &[Budget]) -> HashMap<i64, &Budget> {
    let mut index = HashMap::new();
    for budget in budgets {
        index.entry(budget.category_id).or_insert(budget);
    }
    index
}

fn non_empty(currency: Option<&str>) -> Option<&str> {
    currency.map(str::trim).filter(|c| !c.is_empty())
}

fn spend_entry(
    category: ExpenseCategory,
    progress: BudgetProgress,
    budget: Option<&Budget>,
) -> CategorySpendEntry {
    let budget_amount = progress
        .budget_amount
        .or_else(|| budget.map(|b| b.amount))
        .map(non_negative)
        .unwrap_or(0.0);

    // Budget currency, then progress currency, then the default
    let currency = non_empty(budget.and_then(|b| b.currency.as_deref()))
        .or_else(|| non_empty(progress.currency.as_deref()))
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();

    CategorySpendEntry {
        category_id: category.id,
        category_name: category.name,
        spent: non_negative(progress.spent),
        budget_amount,
        currency,
    }
}

fn summarize_goal(goal: Goal) -> GoalSummary {
    let current: f64 = goal
        .contributions
        .iter()
        .map(|c| c.amount.filter(|a| a.is_finite()).unwrap_or(0.0))
        .sum();

    GoalSummary {
        name: goal.name,
        target_amount: non_negative(goal.target_amount),
        current_amount: non_negative(current),
        target_date: goal.target_date,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{GoalContribution, Overview};
    use crate::store::{InMemoryStore, StoreOperation};

    const USER: &str = "u1";

    fn aggregator(store: InMemoryStore) -> ContextAggregator {
        ContextAggregator::new(Arc::new(store))
    }

    fn budget(category_id: i64, amount: f64, currency: Option<&str>) -> Budget {
        Budget {
            category_id,
            amount,
            currency: currency.map(String::from),
        }
    }

    fn progress(spent: f64, budget_amount: Option<f64>, currency: Option<&str>) -> BudgetProgress {
        BudgetProgress {
            spent,
            budget_amount,
            currency: currency.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let ctx = aggregator(InMemoryStore::new())
            .build_context(USER, 3, 2026)
            .await
            .unwrap();
        assert_eq!(ctx, MonthlyContext::empty(3, 2026));
    }

    #[tokio::test]
    async fn test_totals_and_bills() {
        let store = InMemoryStore::new().with_overview(
            USER,
            3,
            2026,
            Overview {
                income: 1000.0,
                expense: 1250.5,
                balance: 0.0,
                upcoming_bills_count: 2,
            },
        );
        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        assert_eq!(ctx.totals.balance, -250.5);
        assert_eq!(ctx.upcoming_bills_count, 2);
    }

    #[tokio::test]
    async fn test_negative_values_clamped() {
        let store = InMemoryStore::new()
            .with_overview(
                USER,
                3,
                2026,
                Overview {
                    income: -10.0,
                    expense: 50.0,
                    balance: 999.0,
                    upcoming_bills_count: -3,
                },
            )
            .with_category(USER, 1, "Refunds")
            .with_progress(USER, 1, 3, 2026, progress(-40.0, Some(-5.0), None));

        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        assert_eq!(ctx.totals, Totals::new(0.0, 50.0));
        assert_eq!(ctx.upcoming_bills_count, 0);
        assert_eq!(ctx.expense_by_category[0].spent, 0.0);
        assert_eq!(ctx.expense_by_category[0].budget_amount, 0.0);
    }

    #[tokio::test]
    async fn test_currency_fallback_order() {
        let store = InMemoryStore::new()
            .with_category(USER, 1, "Dining")
            .with_category(USER, 2, "Travel")
            .with_category(USER, 3, "Misc")
            .with_category(USER, 4, "Books")
            .with_budget(USER, 3, 2026, budget(1, 200.0, Some("EUR")))
            .with_budget(USER, 3, 2026, budget(4, 50.0, Some("")))
            .with_progress(USER, 1, 3, 2026, progress(300.0, Some(200.0), Some("GBP")))
            .with_progress(USER, 2, 3, 2026, progress(80.0, None, Some("GBP")))
            .with_progress(USER, 3, 3, 2026, progress(10.0, None, None))
            .with_progress(USER, 4, 3, 2026, progress(5.0, None, Some("JPY")));

        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        let currencies: Vec<_> = ctx
            .expense_by_category
            .iter()
            .map(|e| e.currency.as_str())
            .collect();
        // Empty budget currency counts as absent
        assert_eq!(currencies, vec!["EUR", "GBP", "USD", "JPY"]);
    }

    #[tokio::test]
    async fn test_budget_amount_fallback() {
        let store = InMemoryStore::new()
            .with_category(USER, 1, "Dining")
            .with_category(USER, 2, "Travel")
            .with_category(USER, 3, "Misc")
            .with_budget(USER, 3, 2026, budget(2, 150.0, None))
            .with_progress(USER, 1, 3, 2026, progress(300.0, Some(200.0), None))
            .with_progress(USER, 2, 3, 2026, progress(80.0, None, None));

        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        let amounts: Vec<_> = ctx
            .expense_by_category
            .iter()
            .map(|e| e.budget_amount)
            .collect();
        assert_eq!(amounts, vec![200.0, 150.0, 0.0]);
    }

    #[tokio::test]
    async fn test_duplicate_categories_collapsed() {
        let store = InMemoryStore::new()
            .with_category(USER, 1, "Dining")
            .with_category(USER, 2, "Travel")
            .with_category(USER, 1, "Dining (dup)");

        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        let names: Vec<_> = ctx
            .expense_by_category
            .iter()
            .map(|e| e.category_name.as_str())
            .collect();
        assert_eq!(names, vec!["Dining", "Travel"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved_under_out_of_order_completion() {
        let store = InMemoryStore::new()
            .with_category(USER, 1, "Slow")
            .with_category(USER, 2, "Medium")
            .with_category(USER, 3, "Fast")
            .with_progress(USER, 1, 3, 2026, progress(10.0, None, None))
            .with_progress(USER, 2, 3, 2026, progress(20.0, None, None))
            .with_progress(USER, 3, 3, 2026, progress(30.0, None, None))
            .with_progress_delay(1, Duration::from_millis(300))
            .with_progress_delay(2, Duration::from_millis(100));

        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        let ids: Vec<_> = ctx
            .expense_by_category
            .iter()
            .map(|e| (e.category_id, e.spent))
            .collect();
        assert_eq!(ids, vec![(1, 10.0), (2, 20.0), (3, 30.0)]);
    }

    #[tokio::test]
    async fn test_goal_sums() {
        let store = InMemoryStore::new().with_goal(
            USER,
            Goal {
                name: "Emergency fund".to_string(),
                target_amount: 5000.0,
                target_date: None,
                contributions: vec![
                    GoalContribution { amount: Some(250.0) },
                    GoalContribution { amount: None },
                    GoalContribution { amount: Some(100.0) },
                ],
            },
        );

        let ctx = aggregator(store).build_context(USER, 3, 2026).await.unwrap();
        assert_eq!(ctx.goals[0].current_amount, 350.0);
        assert_eq!(ctx.goals[0].target_amount, 5000.0);
    }

    #[tokio::test]
    async fn test_any_failure_fails_aggregation() {
        for op in [
            StoreOperation::Overview,
            StoreOperation::Categories,
            StoreOperation::Budgets,
            StoreOperation::Goals,
            StoreOperation::BudgetProgress,
        ] {
            let store = InMemoryStore::new()
                .with_category(USER, 1, "Dining")
                .failing(op);
            let err = aggregator(store)
                .build_context(USER, 3, 2026)
                .await
                .unwrap_err();
            assert!(err.is_data_access(), "{:?} should fail aggregation", op);
        }
    }

    #[test]
    fn test_into_data_access_wraps_other_errors() {
        let err = into_data_access(Error::InvalidData("bad month".into()));
        assert!(matches!(err, Error::DataAccess(ref m) if m.contains("bad month")));
    }
}
