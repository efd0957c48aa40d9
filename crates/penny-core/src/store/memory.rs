//! In-memory record store
//!
//! Holds records per user in plain collections. Unknown users and months read
//! as empty. Individual operations can be made to fail (to exercise the
//! aggregator's all-or-nothing behavior) and progress lookups can be delayed
//! per category (to exercise order preservation under out-of-order completion).

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Budget, BudgetProgress, ExpenseCategory, Goal, Overview};

use super::RecordStore;

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Overview,
    Categories,
    Budgets,
    BudgetProgress,
    Goals,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Categories => "categories",
            Self::Budgets => "budgets",
            Self::BudgetProgress => "budget_progress",
            Self::Goals => "goals",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct UserRecords {
    overviews: HashMap<(u32, i32), Overview>,
    categories: Vec<ExpenseCategory>,
    budgets: HashMap<(u32, i32), Vec<Budget>>,
    progress: HashMap<(i64, u32, i32), BudgetProgress>,
    goals: Vec<Goal>,
}

/// Record store backed by in-process collections
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    users: HashMap<String, UserRecords>,
    failing: HashSet<StoreOperation>,
    progress_delays: HashMap<i64, Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_mut(&mut self, user_id: &str) -> &mut UserRecords {
        self.users.entry(user_id.to_string()).or_default()
    }

    /// Set the overview for a month
    pub fn with_overview(mut self, user_id: &str, month: u32, year: i32, overview: Overview) -> Self {
        self.user_mut(user_id).overviews.insert((month, year), overview);
        self
    }

    /// Append an expense category
    pub fn with_category(mut self, user_id: &str, id: i64, name: &str) -> Self {
        self.user_mut(user_id).categories.push(ExpenseCategory {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Append a budget for a month
    pub fn with_budget(
        mut self,
        user_id: &str,
        month: u32,
        year: i32,
        budget: Budget,
    ) -> Self {
        self.user_mut(user_id)
            .budgets
            .entry((month, year))
            .or_default()
            .push(budget);
        self
    }

    /// Set the budget progress record for a category and month
    pub fn with_progress(
        mut self,
        user_id: &str,
        category_id: i64,
        month: u32,
        year: i32,
        progress: BudgetProgress,
    ) -> Self {
        self.user_mut(user_id)
            .progress
            .insert((category_id, month, year), progress);
        self
    }

    /// Append a savings goal
    pub fn with_goal(mut self, user_id: &str, goal: Goal) -> Self {
        self.user_mut(user_id).goals.push(goal);
        self
    }

    /// Make an operation fail for every user
    pub fn failing(mut self, operation: StoreOperation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Delay progress lookups for one category
    pub fn with_progress_delay(mut self, category_id: i64, delay: Duration) -> Self {
        self.progress_delays.insert(category_id, delay);
        self
    }

    fn check(&self, operation: StoreOperation) -> Result<()> {
        if self.failing.contains(&operation) {
            return Err(Error::DataAccess(format!(
                "{} lookup failed",
                operation.as_str()
            )));
        }
        Ok(())
    }

    fn user(&self, user_id: &str) -> Option<&UserRecords> {
        self.users.get(user_id)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_overview(&self, user_id: &str, month: u32, year: i32) -> Result<Overview> {
        self.check(StoreOperation::Overview)?;
        Ok(self
            .user(user_id)
            .and_then(|u| u.overviews.get(&(month, year)).cloned())
            .unwrap_or_default())
    }

    async fn list_expense_categories(&self, user_id: &str) -> Result<Vec<ExpenseCategory>> {
        self.check(StoreOperation::Categories)?;
        Ok(self
            .user(user_id)
            .map(|u| u.categories.clone())
            .unwrap_or_default())
    }

    async fn list_budgets(&self, user_id: &str, month: u32, year: i32) -> Result<Vec<Budget>> {
        self.check(StoreOperation::Budgets)?;
        Ok(self
            .user(user_id)
            .and_then(|u| u.budgets.get(&(month, year)).cloned())
            .unwrap_or_default())
    }

    async fn get_budget_progress(
        &self,
        user_id: &str,
        category_id: i64,
        month: u32,
        year: i32,
    ) -> Result<BudgetProgress> {
        if let Some(delay) = self.progress_delays.get(&category_id) {
            tokio::time::sleep(*delay).await;
        }
        self.check(StoreOperation::BudgetProgress)?;
        Ok(self
            .user(user_id)
            .and_then(|u| u.progress.get(&(category_id, month, year)).cloned())
            .unwrap_or_default())
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        self.check(StoreOperation::Goals)?;
        Ok(self
            .user(user_id)
            .map(|u| u.goals.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_user_reads_empty() {
        let store = InMemoryStore::new();
        assert!(store.list_expense_categories("nobody").await.unwrap().is_empty());
        assert_eq!(
            store.get_overview("nobody", 1, 2026).await.unwrap(),
            Overview::default()
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryStore::new().failing(StoreOperation::Goals);
        let err = store.list_goals("u1").await.unwrap_err();
        assert!(err.is_data_access());
        assert!(store.list_budgets("u1", 1, 2026).await.is_ok());
    }

    #[tokio::test]
    async fn test_budgets_scoped_by_month() {
        let store = InMemoryStore::new().with_budget(
            "u1",
            2,
            2026,
            Budget {
                category_id: 1,
                amount: 100.0,
                currency: None,
            },
        );
        assert_eq!(store.list_budgets("u1", 2, 2026).await.unwrap().len(), 1);
        assert!(store.list_budgets("u1", 3, 2026).await.unwrap().is_empty());
    }
}
