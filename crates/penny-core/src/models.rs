//! Domain models for Penny
//!
//! Two groups of types live here:
//! - Records as the financial record store hands them out (`Overview`,
//!   `ExpenseCategory`, `Budget`, `BudgetProgress`, `Goal`)
//! - The per-request `MonthlyContext` snapshot the advisors consume

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Currency used when neither the budget nor the progress record names one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of a transaction. Only posted transactions count toward totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Posted,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posted => "posted",
            Self::Pending => "pending",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "posted" => Ok(Self::Posted),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

// ========== Record store types ==========

/// Monthly totals as reported by the record store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub upcoming_bills_count: i64,
}

/// An expense category owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
}

/// A monthly budget for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub category_id: i64,
    pub amount: f64,
    pub currency: Option<String>,
}

/// Spend against budget for one category and month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub spent: f64,
    /// None when the store has no budget row for the category
    pub budget_amount: Option<f64>,
    pub currency: Option<String>,
}

/// A single contribution toward a savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalContribution {
    pub amount: Option<f64>,
}

/// A savings goal with its recorded contributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub name: String,
    pub target_amount: f64,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub contributions: Vec<GoalContribution>,
}

/// New transaction for insertion into the SQLite store
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    pub amount: f64,
    pub date: NaiveDate,
    pub status: TransactionStatus,
    pub currency: Option<String>,
    pub description: String,
}

// ========== Monthly context ==========

/// Income, expense and balance for the month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    /// income - expense, may be negative
    pub balance: f64,
}

impl Totals {
    /// Build totals from raw amounts, clamping negatives and recomputing the balance
    pub fn new(income: f64, expense: f64) -> Self {
        let income = non_negative(income);
        let expense = non_negative(expense);
        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// Spend vs budget for one expense category in the month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpendEntry {
    pub category_id: i64,
    pub category_name: String,
    pub spent: f64,
    /// 0 when no budget is configured
    pub budget_amount: f64,
    pub currency: String,
}

/// Progress toward a savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
}

/// Immutable snapshot of one user's finances for one month.
///
/// Built fresh for every advisory request and never mutated by the advisors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyContext {
    pub month: u32,
    pub year: i32,
    pub totals: Totals,
    /// Category declaration order, not sorted
    pub expense_by_category: Vec<CategorySpendEntry>,
    pub upcoming_bills_count: u32,
    pub goals: Vec<GoalSummary>,
}

impl MonthlyContext {
    /// A context with no activity for the given month
    pub fn empty(month: u32, year: i32) -> Self {
        Self {
            month,
            year,
            totals: Totals::default(),
            expense_by_category: Vec::new(),
            upcoming_bills_count: 0,
            goals: Vec::new(),
        }
    }
}

/// Clamp to zero, treating NaN as zero
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
