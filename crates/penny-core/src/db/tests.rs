//! Database tests

use super::*;
use crate::models::*;
use crate::store::RecordStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(category_id: i64, amount: f64, day: NaiveDate) -> NewTransaction {
    NewTransaction {
        category_id: Some(category_id),
        kind: TransactionKind::Expense,
        amount,
        date: day,
        status: TransactionStatus::Posted,
        currency: None,
        description: "test".to_string(),
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.expense_categories("u1").unwrap().is_empty());
    assert!(db.goals_with_contributions("u1").unwrap().is_empty());
}

#[test]
fn test_month_bounds() {
    assert_eq!(
        month_bounds(12, 2025).unwrap(),
        (date(2025, 12, 1), date(2026, 1, 1))
    );
    assert_eq!(month_bounds(2, 2026).unwrap(), (date(2026, 2, 1), date(2026, 3, 1)));
    assert!(month_bounds(13, 2026).is_err());
}

#[test]
fn test_add_category_is_idempotent() {
    let db = Database::in_memory().unwrap();
    let a = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    let b = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    assert_eq!(a, b);

    db.add_category("u1", "Salary", TransactionKind::Income).unwrap();
    let categories = db.expense_categories("u1").unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Dining");
}

#[test]
fn test_categories_keep_insertion_order() {
    let db = Database::in_memory().unwrap();
    for name in ["Rent", "Dining", "Auto"] {
        db.add_category("u1", name, TransactionKind::Expense).unwrap();
    }
    let names: Vec<_> = db
        .expense_categories("u1")
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Rent", "Dining", "Auto"]);
}

#[test]
fn test_categories_scoped_by_user() {
    let db = Database::in_memory().unwrap();
    db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    db.add_category("u2", "Travel", TransactionKind::Expense).unwrap();
    assert_eq!(db.expense_categories("u2").unwrap()[0].name, "Travel");
}

#[test]
fn test_set_budget_upserts() {
    let db = Database::in_memory().unwrap();
    let cat = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    db.set_budget("u1", cat, 3, 2026, 200.0, Some("EUR")).unwrap();
    db.set_budget("u1", cat, 3, 2026, 250.0, None).unwrap();

    let budgets = db.budgets_for_month("u1", 3, 2026).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, 250.0);
    assert_eq!(budgets[0].currency, None);
    assert!(db.budgets_for_month("u1", 4, 2026).unwrap().is_empty());
}

#[test]
fn test_set_budget_rejects_negative() {
    let db = Database::in_memory().unwrap();
    let cat = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    assert!(db.set_budget("u1", cat, 3, 2026, -1.0, None).is_err());
}

#[test]
fn test_monthly_overview() {
    let db = Database::in_memory().unwrap();
    let cat = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();

    db.add_transaction(
        "u1",
        &NewTransaction {
            category_id: None,
            kind: TransactionKind::Income,
            amount: 3000.0,
            date: date(2026, 3, 1),
            status: TransactionStatus::Posted,
            currency: None,
            description: "Salary".to_string(),
        },
    )
    .unwrap();
    db.add_transaction("u1", &expense(cat, 120.0, date(2026, 3, 10)))
        .unwrap();
    // Stored negative amounts count by magnitude
    db.add_transaction("u1", &expense(cat, -30.0, date(2026, 3, 31)))
        .unwrap();
    // Pending and out-of-month transactions are ignored
    db.add_transaction(
        "u1",
        &NewTransaction {
            status: TransactionStatus::Pending,
            ..expense(cat, 999.0, date(2026, 3, 12))
        },
    )
    .unwrap();
    db.add_transaction("u1", &expense(cat, 500.0, date(2026, 4, 1)))
        .unwrap();

    db.add_bill("u1", "Rent", 1200.0, date(2026, 3, 28), false).unwrap();
    db.add_bill("u1", "Phone", 40.0, date(2026, 3, 5), true).unwrap();
    db.add_bill("u1", "Water", 30.0, date(2026, 4, 2), false).unwrap();

    let overview = db.monthly_overview("u1", 3, 2026).unwrap();
    assert_eq!(overview.income, 3000.0);
    assert_eq!(overview.expense, 150.0);
    assert_eq!(overview.balance, 2850.0);
    assert_eq!(overview.upcoming_bills_count, 1);
}

#[test]
fn test_budget_progress_with_budget() {
    let db = Database::in_memory().unwrap();
    let cat = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    db.set_budget("u1", cat, 3, 2026, 200.0, Some("EUR")).unwrap();
    db.add_transaction("u1", &expense(cat, 120.0, date(2026, 3, 2)))
        .unwrap();
    db.add_transaction("u1", &expense(cat, 180.0, date(2026, 3, 20)))
        .unwrap();

    let progress = db.budget_progress("u1", cat, 3, 2026).unwrap();
    assert_eq!(progress.spent, 300.0);
    assert_eq!(progress.budget_amount, Some(200.0));
    assert_eq!(progress.currency.as_deref(), Some("EUR"));
}

#[test]
fn test_budget_progress_without_budget_uses_transaction_currency() {
    let db = Database::in_memory().unwrap();
    let cat = db.add_category("u1", "Travel", TransactionKind::Expense).unwrap();
    db.add_transaction(
        "u1",
        &NewTransaction {
            currency: Some("GBP".to_string()),
            ..expense(cat, 50.0, date(2026, 3, 2))
        },
    )
    .unwrap();

    let progress = db.budget_progress("u1", cat, 3, 2026).unwrap();
    assert_eq!(progress.spent, 50.0);
    assert_eq!(progress.budget_amount, None);
    assert_eq!(progress.currency.as_deref(), Some("GBP"));
}

#[test]
fn test_goals_with_contributions() {
    let db = Database::in_memory().unwrap();
    let goal = db
        .add_goal("u1", "Emergency fund", 5000.0, Some(date(2026, 12, 31)))
        .unwrap();
    db.add_contribution(goal, 250.0, date(2026, 1, 15)).unwrap();
    db.add_contribution(goal, 100.0, date(2026, 2, 15)).unwrap();
    db.add_goal("u1", "Vacation", 1500.0, None).unwrap();

    let goals = db.goals_with_contributions("u1").unwrap();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].name, "Emergency fund");
    assert_eq!(goals[0].target_date, Some(date(2026, 12, 31)));
    assert_eq!(goals[0].contributions.len(), 2);
    assert!(goals[1].contributions.is_empty());
    assert_eq!(goals[1].target_date, None);
}

#[test]
fn test_add_contribution_validation() {
    let db = Database::in_memory().unwrap();
    let goal = db.add_goal("u1", "Car", 8000.0, None).unwrap();
    assert!(matches!(
        db.add_contribution(goal, 0.0, date(2026, 1, 1)),
        Err(Error::InvalidData(_))
    ));
    assert!(matches!(
        db.add_contribution(goal + 100, 10.0, date(2026, 1, 1)),
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_record_store_impl() {
    let db = Database::in_memory().unwrap();
    let cat = db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();
    db.set_budget("u1", cat, 3, 2026, 200.0, None).unwrap();

    let store: &dyn RecordStore = &db;
    assert_eq!(store.list_expense_categories("u1").await.unwrap().len(), 1);
    assert_eq!(store.list_budgets("u1", 3, 2026).await.unwrap().len(), 1);
    let progress = store.get_budget_progress("u1", cat, 3, 2026).await.unwrap();
    assert_eq!(progress.spent, 0.0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_record_store_reads_leave_runtime_free() {
    let db = Database::in_memory().unwrap();
    db.add_category("u1", "Dining", TransactionKind::Expense).unwrap();

    // Exhaust the pool so the next read has to wait for a connection
    let held: Vec<_> = (0..POOL_SIZE).map(|_| db.conn().unwrap()).collect();

    let store = db.clone();
    let read = tokio::spawn(async move { store.list_expense_categories("u1").await });

    // The single runtime thread must stay free to release the connections
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    drop(held);

    let categories = read.await.unwrap().unwrap();
    assert_eq!(categories.len(), 1);
}

#[test]
fn test_encrypted_requires_key_env() {
    if std::env::var(DB_KEY_ENV).is_ok() {
        return;
    }
    let path = std::env::temp_dir().join(format!("penny_enc_{}.db", std::process::id()));
    let result = Database::new(&path.to_string_lossy());
    assert!(matches!(result, Err(Error::Encryption(_))));
}
