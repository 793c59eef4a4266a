//! Shared setup for repository integration tests.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use expenseflow_core::user::Role;
use expenseflow_db::entities::users;
use expenseflow_db::repositories::{CreateUserInput, SubmitExpenseInput};
use expenseflow_db::{UserRepository, connect, migrate};
use expenseflow_shared::DatabaseConfig;
use expenseflow_shared::types::UserId;

/// Connects to a fresh in-memory database with the schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = connect(&DatabaseConfig::with_url("sqlite::memory:"))
        .await
        .expect("Failed to connect to database");
    migrate(&db).await.expect("Failed to run migrations");
    db
}

/// Creates a user with a unique email.
pub async fn create_user(db: &DatabaseConnection, name: &str, role: Role) -> users::Model {
    UserRepository::new(db.clone())
        .create_user(CreateUserInput {
            name: name.to_string(),
            email: format!("{}-{}@example.com", name.to_lowercase(), uuid::Uuid::new_v4()),
            role,
            manager_id: None,
        })
        .await
        .expect("Failed to create user")
}

/// Creates the admin.
pub async fn create_admin(db: &DatabaseConnection) -> users::Model {
    UserRepository::new(db.clone())
        .ensure_admin("Admin", "admin@example.com")
        .await
        .expect("Failed to create admin")
}

/// Typed id of a user row.
pub fn uid(user: &users::Model) -> UserId {
    UserId::from_uuid(user.id)
}

/// Expense input in `currency` dated now.
pub fn expense(amount: Decimal, currency: &str) -> SubmitExpenseInput {
    expense_on(amount, currency, Utc::now().into())
}

/// Expense input with an explicit date.
pub fn expense_on(
    amount: Decimal,
    currency: &str,
    expense_date: DateTime<FixedOffset>,
) -> SubmitExpenseInput {
    SubmitExpenseInput {
        amount,
        currency: currency.to_string(),
        category: "Travel".to_string(),
        description: "Client visit".to_string(),
        expense_date,
    }
}
