//! Demo data seeding
//!
//! Loads one month of realistic records for a user so `penny advise` has
//! something to work with: several expense categories (some over budget, one
//! without a budget), income, a pending transaction, bills and a savings goal.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use penny_core::models::{NewTransaction, TransactionKind, TransactionStatus};
use penny_core::Database;

/// What a seed run created
#[derive(Debug, Default, PartialEq)]
pub struct SeedSummary {
    pub categories: usize,
    pub budgets: usize,
    pub transactions: usize,
    pub bills: usize,
    pub goals: usize,
}

/// (category, monthly budget, expenses as (day, amount))
const DEMO_SPENDING: &[(&str, Option<f64>, &[(u32, f64)])] = &[
    ("Rent", Some(1500.0), &[(1, 1500.0)]),
    ("Groceries", Some(400.0), &[(3, 86.40), (10, 112.75), (17, 94.10), (24, 101.30)]),
    ("Dining", Some(200.0), &[(6, 48.00), (13, 72.50), (20, 95.25), (27, 64.00)]),
    ("Transport", Some(150.0), &[(5, 45.00), (19, 45.00)]),
    ("Utilities", Some(180.0), &[(8, 62.40)]),
    ("Hobbies", None, &[(15, 129.99)]),
];

pub fn cmd_seed(db: &Database, user: &str, month: Option<u32>, year: Option<i32>) -> Result<()> {
    let today = Local::now().date_naive();
    let month = month.unwrap_or_else(|| today.month());
    let year = year.unwrap_or_else(|| today.year());

    println!("🌱 Seeding demo data for {} ({:04}-{:02})...", user, year, month);

    let summary = seed_demo_month(db, user, month, year)?;

    println!("   Categories: {}", summary.categories);
    println!("   Budgets: {}", summary.budgets);
    println!("   Transactions: {}", summary.transactions);
    println!("   Bills: {}", summary.bills);
    println!("   Goals: {}", summary.goals);
    println!("✅ Demo data loaded. Try: penny advise --user {} --month {} --year {}", user, month, year);

    Ok(())
}

/// Seed one month of demo records. Refuses to seed a month twice.
pub fn seed_demo_month(db: &Database, user: &str, month: u32, year: i32) -> Result<SeedSummary> {
    if !(1..=12).contains(&month) {
        bail!("Month must be between 1 and 12, got {}", month);
    }
    if !db
        .budgets_for_month(user, month, year)
        .context("Failed to read budgets")?
        .is_empty()
    {
        bail!(
            "Demo data already seeded for {} in {:04}-{:02}",
            user,
            year,
            month
        );
    }

    let day = |d: u32| -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, d)
            .with_context(|| format!("Invalid date {:04}-{:02}-{:02}", year, month, d))
    };

    let mut summary = SeedSummary::default();

    db.add_category(user, "Salary", TransactionKind::Income)?;
    db.add_transaction(
        user,
        &NewTransaction {
            category_id: None,
            kind: TransactionKind::Income,
            amount: 4200.0,
            date: day(1)?,
            status: TransactionStatus::Posted,
            currency: None,
            description: "Salary".to_string(),
        },
    )?;
    summary.transactions += 1;

    for (name, budget, expenses) in DEMO_SPENDING {
        let category_id = db.add_category(user, name, TransactionKind::Expense)?;
        summary.categories += 1;

        if let Some(amount) = budget {
            db.set_budget(user, category_id, month, year, *amount, Some("USD"))?;
            summary.budgets += 1;
        }

        for (d, amount) in expenses.iter() {
            db.add_transaction(
                user,
                &NewTransaction {
                    category_id: Some(category_id),
                    kind: TransactionKind::Expense,
                    amount: *amount,
                    date: day(*d)?,
                    status: TransactionStatus::Posted,
                    currency: None,
                    description: format!("{} purchase", name),
                },
            )?;
            summary.transactions += 1;
        }
    }

    // Pending transactions don't count toward spend
    let dining = db.add_category(user, "Dining", TransactionKind::Expense)?;
    db.add_transaction(
        user,
        &NewTransaction {
            category_id: Some(dining),
            kind: TransactionKind::Expense,
            amount: 58.00,
            date: day(28)?,
            status: TransactionStatus::Pending,
            currency: None,
            description: "Dining purchase (pending)".to_string(),
        },
    )?;
    summary.transactions += 1;

    db.add_bill(user, "Internet", 60.0, day(25)?, false)?;
    db.add_bill(user, "Phone", 35.0, day(12)?, true)?;
    summary.bills += 2;

    let target_date = NaiveDate::from_ymd_opt(year + 1, month, 1);
    let goal = db.add_goal(user, "Emergency fund", 6000.0, target_date)?;
    db.add_contribution(goal, 500.0, day(2)?)?;
    db.add_contribution(goal, 250.0, day(16)?)?;
    summary.goals += 1;

    Ok(summary)
}
