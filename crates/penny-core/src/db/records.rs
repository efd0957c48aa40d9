//! Financial record operations
//!
//! Write helpers exist for seeding and tests; the advisory engine itself only
//! reads through the `RecordStore` implementation at the bottom of this file.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{month_bounds, Database};
use crate::error::{Error, Result};
use crate::models::{
    Budget, BudgetProgress, ExpenseCategory, Goal, GoalContribution, NewTransaction, Overview,
    TransactionKind,
};
use crate::store::RecordStore;

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
}

fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

impl Database {
    /// Create or get a category
    pub fn add_category(&self, user_id: &str, name: &str, kind: TransactionKind) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE user_id = ? AND name = ? AND kind = ?",
                params![user_id, name, kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO categories (user_id, name, kind) VALUES (?, ?, ?)",
            params![user_id, name, kind.as_str()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Create or replace the budget for a category and month
    pub fn set_budget(
        &self,
        user_id: &str,
        category_id: i64,
        month: u32,
        year: i32,
        amount: f64,
        currency: Option<&str>,
    ) -> Result<i64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Budget amount must be non-negative, got {}",
                amount
            )));
        }
        month_bounds(month, year)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, category_id, month, year, amount, currency)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(category_id, month, year)
            DO UPDATE SET amount = excluded.amount, currency = excluded.currency
            "#,
            params![user_id, category_id, month, year, amount, currency],
        )?;

        let id = conn.query_row(
            "SELECT id FROM budgets WHERE category_id = ? AND month = ? AND year = ?",
            params![category_id, month, year],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Record a transaction. Amounts are stored as positive magnitudes.
    pub fn add_transaction(&self, user_id: &str, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (user_id, category_id, kind, amount, date, status, currency, description)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.category_id,
                tx.kind.as_str(),
                tx.amount.abs(),
                format_date(tx.date),
                tx.status.as_str(),
                tx.currency,
                tx.description,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a bill
    pub fn add_bill(
        &self,
        user_id: &str,
        name: &str,
        amount: f64,
        due_date: NaiveDate,
        paid: bool,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO bills (user_id, name, amount, due_date, paid) VALUES (?, ?, ?, ?, ?)",
            params![user_id, name, amount, format_date(due_date), paid],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Create a savings goal
    pub fn add_goal(
        &self,
        user_id: &str,
        name: &str,
        target_amount: f64,
        target_date: Option<NaiveDate>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO goals (user_id, name, target_amount, target_date) VALUES (?, ?, ?, ?)",
            params![user_id, name, target_amount, target_date.map(format_date)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a contribution toward a goal
    pub fn add_contribution(&self, goal_id: i64, amount: f64, date: NaiveDate) -> Result<i64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Contribution amount must be positive, got {}",
                amount
            )));
        }

        let conn = self.conn()?;
        let exists: Option<i64> = conn
            .query_row("SELECT id FROM goals WHERE id = ?", params![goal_id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("Goal {}", goal_id)));
        }

        conn.execute(
            "INSERT INTO goal_contributions (goal_id, amount, contributed_at) VALUES (?, ?, ?)",
            params![goal_id, amount, format_date(date)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Posted income/expense totals and unpaid bills due in the month
    pub fn monthly_overview(&self, user_id: &str, month: u32, year: i32) -> Result<Overview> {
        let (start, end) = month_bounds(month, year)?;
        let (start, end) = (format_date(start), format_date(end));
        let conn = self.conn()?;

        let (income, expense): (f64, f64) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE user_id = ? AND status = 'posted' AND date >= ? AND date < ?
            "#,
            params![user_id, start, end],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let upcoming_bills_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bills WHERE user_id = ? AND paid = 0 AND due_date >= ? AND due_date < ?",
            params![user_id, start, end],
            |row| row.get(0),
        )?;

        Ok(Overview {
            income,
            expense,
            balance: income - expense,
            upcoming_bills_count,
        })
    }

    /// Expense categories in insertion order
    pub fn expense_categories(&self, user_id: &str) -> Result<Vec<ExpenseCategory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name FROM categories WHERE user_id = ? AND kind = 'expense' ORDER BY id",
        )?;

        let categories = stmt
            .query_map(params![user_id], |row| {
                Ok(ExpenseCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Budgets configured for a month
    pub fn budgets_for_month(&self, user_id: &str, month: u32, year: i32) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category_id, amount, currency FROM budgets WHERE user_id = ? AND month = ? AND year = ? ORDER BY id",
        )?;

        let budgets = stmt
            .query_map(params![user_id, month, year], |row| {
                Ok(Budget {
                    category_id: row.get(0)?,
                    amount: row.get(1)?,
                    currency: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Posted spend for a category against its budget
    ///
    /// The progress currency is the budget's currency when one is set,
    /// otherwise the currency of the latest posted expense in the month.
    pub fn budget_progress(
        &self,
        user_id: &str,
        category_id: i64,
        month: u32,
        year: i32,
    ) -> Result<BudgetProgress> {
        let (start, end) = month_bounds(month, year)?;
        let (start, end) = (format_date(start), format_date(end));
        let conn = self.conn()?;

        let spent: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0) FROM transactions
            WHERE user_id = ? AND category_id = ? AND kind = 'expense' AND status = 'posted'
              AND date >= ? AND date < ?
            "#,
            params![user_id, category_id, start, end],
            |row| row.get(0),
        )?;

        let budget: Option<(f64, Option<String>)> = conn
            .query_row(
                "SELECT amount, currency FROM budgets WHERE category_id = ? AND month = ? AND year = ?",
                params![category_id, month, year],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let tx_currency: Option<String> = conn
            .query_row(
                r#"
                SELECT currency FROM transactions
                WHERE user_id = ? AND category_id = ? AND kind = 'expense' AND status = 'posted'
                  AND currency IS NOT NULL AND date >= ? AND date < ?
                ORDER BY date DESC, id DESC LIMIT 1
                "#,
                params![user_id, category_id, start, end],
                |row| row.get(0),
            )
            .optional()?;

        let (budget_amount, budget_currency) = match budget {
            Some((amount, currency)) => (Some(amount), currency),
            None => (None, None),
        };

        Ok(BudgetProgress {
            spent,
            budget_amount,
            currency: budget_currency.or(tx_currency),
        })
    }

    /// Savings goals with their contributions
    pub fn goals_with_contributions(&self, user_id: &str) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, target_amount, target_date FROM goals WHERE user_id = ? ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let target_date: Option<String> = row.get(3)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    Goal {
                        name: row.get(1)?,
                        target_amount: row.get(2)?,
                        target_date: parse_date(target_date),
                        contributions: Vec::new(),
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut contrib_stmt =
            conn.prepare("SELECT amount FROM goal_contributions WHERE goal_id = ? ORDER BY id")?;

        let mut goals = Vec::with_capacity(rows.len());
        for (goal_id, mut goal) in rows {
            goal.contributions = contrib_stmt
                .query_map(params![goal_id], |row| {
                    Ok(GoalContribution {
                        amount: row.get(0)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            goals.push(goal);
        }

        Ok(goals)
    }
}

impl Database {
    /// Run a synchronous read on the blocking thread pool
    async fn blocking<T, F>(&self, read: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || read(&db))
            .await
            .map_err(|e| Error::DataAccess(format!("Record read task failed: {}", e)))?
    }
}

// rusqlite calls block, so every read is moved off the async runtime
#[async_trait]
impl RecordStore for Database {
    async fn get_overview(&self, user_id: &str, month: u32, year: i32) -> Result<Overview> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.monthly_overview(&user_id, month, year))
            .await
    }

    async fn list_expense_categories(&self, user_id: &str) -> Result<Vec<ExpenseCategory>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.expense_categories(&user_id)).await
    }

    async fn list_budgets(&self, user_id: &str, month: u32, year: i32) -> Result<Vec<Budget>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.budgets_for_month(&user_id, month, year))
            .await
    }

    async fn get_budget_progress(
        &self,
        user_id: &str,
        category_id: i64,
        month: u32,
        year: i32,
    ) -> Result<BudgetProgress> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.budget_progress(&user_id, category_id, month, year))
            .await
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let user_id = user_id.to_string();
        self.blocking(move |db| db.goals_with_contributions(&user_id))
            .await
    }
}
