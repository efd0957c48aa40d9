//! Financial record store abstraction
//!
//! The advisory engine only ever reads from the store. Two implementations
//! ship with the crate:
//! - `Database` (SQLite, see `crate::db`) for real data
//! - `InMemoryStore` for tests and demos, with per-operation failure injection

mod memory;

pub use memory::{InMemoryStore, StoreOperation};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Budget, BudgetProgress, ExpenseCategory, Goal, Overview};

/// Read-only accessor for a user's financial records.
///
/// Implementations must be `Send + Sync` so the aggregator can issue
/// fetches concurrently against a shared store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Income/expense totals and upcoming bill count for a month
    async fn get_overview(&self, user_id: &str, month: u32, year: i32) -> Result<Overview>;

    /// Expense categories in declaration order
    async fn list_expense_categories(&self, user_id: &str) -> Result<Vec<ExpenseCategory>>;

    /// Budgets configured for a month
    async fn list_budgets(&self, user_id: &str, month: u32, year: i32) -> Result<Vec<Budget>>;

    /// Spend against budget for one category and month
    async fn get_budget_progress(
        &self,
        user_id: &str,
        category_id: i64,
        month: u32,
        year: i32,
    ) -> Result<BudgetProgress>;

    /// Savings goals with their contributions
    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>>;
}
