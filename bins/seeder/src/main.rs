//! Database seeder for ExpenseFlow development and testing.
//!
//! Seeds the ADMIN, two employees reporting to the ADMIN, a finance manager
//! and a sample approval rule. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use rust_decimal::Decimal;

use expenseflow_core::user::Role;
use expenseflow_core::workflow::WorkflowError;
use expenseflow_db::entities::users;
use expenseflow_db::repositories::CreateUserInput;
use expenseflow_db::{ApprovalRuleRepository, UserRepository, connect, migrate};
use expenseflow_shared::DatabaseConfig;
use expenseflow_shared::types::{ApprovalRuleId, UserId};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = connect(&DatabaseConfig::with_url(database_url))
        .await
        .expect("Failed to connect to database");
    migrate(&db).await.expect("Failed to apply migrations");

    let users = UserRepository::new(db.clone());

    println!("Seeding admin...");
    let admin = users
        .ensure_admin("Michael Scott", "admin@company.com")
        .await
        .expect("Failed to seed admin");

    println!("Seeding employees...");
    for (name, email) in [
        ("Dwight Schrute", "dwight@company.com"),
        ("Jim Halpert", "jim@company.com"),
    ] {
        seed_user(&users, name, email, Role::Employee, Some(admin.id)).await;
    }

    println!("Seeding finance manager...");
    let finance = seed_user(
        &users,
        "Angela Martin",
        "finance@company.com",
        Role::Manager,
        None,
    )
    .await;

    println!("Seeding approval rule...");
    seed_rule(&ApprovalRuleRepository::new(db), &finance).await;

    println!("Seeding complete!");
}

/// Creates a user unless one with `email` already exists.
async fn seed_user(
    users: &UserRepository,
    name: &str,
    email: &str,
    role: Role,
    manager_id: Option<uuid::Uuid>,
) -> users::Model {
    if let Some(existing) = users
        .find_by_email(email)
        .await
        .expect("Failed to look up user")
    {
        println!("  {name} already exists, skipping...");
        return existing;
    }

    let user = users
        .create_user(CreateUserInput {
            name: name.to_string(),
            email: email.to_string(),
            role,
            manager_id: manager_id.map(UserId::from_uuid),
        })
        .await
        .expect("Failed to create user");
    println!("  Created {name} ({})", user.id);
    user
}

/// Creates a rule requiring the finance manager's approval above 500.
async fn seed_rule(rules: &ApprovalRuleRepository, approver: &users::Model) {
    let rule = match rules.create_rule("Finance review", Decimal::new(500, 0)).await {
        Ok(rule) => rule,
        Err(WorkflowError::DuplicateName(_)) => {
            println!("  Rule already exists, skipping...");
            return;
        }
        Err(e) => panic!("Failed to create rule: {e}"),
    };

    let rule_id = ApprovalRuleId::from_uuid(rule.rule.id);
    rules
        .add_step(rule_id, UserId::from_uuid(approver.id))
        .await
        .expect("Failed to add step");
    println!("  Created rule 'Finance review' ({rule_id})");
}
