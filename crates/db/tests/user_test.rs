//! Integration tests for User repository.

mod common;

use rust_decimal_macros::dec;

use expenseflow_core::user::Role;
use expenseflow_db::entities::sea_orm_active_enums::UserRole;
use expenseflow_db::repositories::{CreateUserInput, UpdateUserInput};
use expenseflow_db::{ApprovalRuleRepository, UserError, UserRepository, WorkflowRepository};
use expenseflow_shared::types::{ApprovalRuleId, UserId};

use common::{create_admin, create_user, expense, setup_db, uid};

#[tokio::test]
async fn test_user_create_and_find_by_id() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());
    let manager = create_user(&db, "Angela", Role::Manager).await;

    let user = repo
        .create_user(CreateUserInput {
            name: "Dwight Schrute".to_string(),
            email: "dwight@company.com".to_string(),
            role: Role::Employee,
            manager_id: Some(uid(&manager)),
        })
        .await
        .expect("Failed to create user");

    assert_eq!(user.role, UserRole::Employee);
    assert_eq!(user.manager_id, Some(manager.id));

    let found = repo.get_user(uid(&user)).await.expect("User should exist");
    assert_eq!(found.email, "dwight@company.com");

    let by_email = repo
        .find_by_email("dwight@company.com")
        .await
        .unwrap()
        .expect("User should exist");
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());

    let input = CreateUserInput {
        name: "Jim".to_string(),
        email: "jim@company.com".to_string(),
        role: Role::Employee,
        manager_id: None,
    };
    repo.create_user(input.clone()).await.unwrap();

    let result = repo.create_user(input).await;
    assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
}

#[tokio::test]
async fn test_invalid_identity() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());

    let result = repo
        .create_user(CreateUserInput {
            name: "Jim".to_string(),
            email: "not-an-email".to_string(),
            role: Role::Employee,
            manager_id: None,
        })
        .await;
    assert!(matches!(result, Err(UserError::InvalidInput(_))));
}

#[tokio::test]
async fn test_single_admin_invariant() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());

    let admin = create_admin(&db).await;
    let again = repo
        .ensure_admin("Someone else", "other@company.com")
        .await
        .unwrap();
    assert_eq!(again.id, admin.id);

    let result = repo
        .create_user(CreateUserInput {
            name: "Second".to_string(),
            email: "second@company.com".to_string(),
            role: Role::Admin,
            manager_id: None,
        })
        .await;
    assert!(matches!(result, Err(UserError::AdminProtected(_))));

    let employee = create_user(&db, "Jim", Role::Employee).await;
    let result = repo
        .update_user(
            uid(&employee),
            UpdateUserInput {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(UserError::AdminProtected(_))));

    let result = repo
        .update_user(
            uid(&admin),
            UpdateUserInput {
                role: Some(Role::Employee),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(UserError::AdminProtected(_))));

    let result = repo.delete_user(uid(&admin)).await;
    assert!(matches!(result, Err(UserError::AdminProtected(_))));
}

#[tokio::test]
async fn test_update_role_and_manager() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());

    let employee = create_user(&db, "Jim", Role::Employee).await;
    let manager = create_user(&db, "Michael", Role::Manager).await;

    let updated = repo
        .update_user(
            uid(&employee),
            UpdateUserInput {
                role: Some(Role::Manager),
                manager_id: Some(Some(uid(&manager))),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, UserRole::Manager);
    assert_eq!(updated.manager_id, Some(manager.id));

    let cleared = repo
        .update_user(
            uid(&employee),
            UpdateUserInput {
                manager_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.manager_id, None);
    assert_eq!(cleared.role, UserRole::Manager);
}

#[tokio::test]
async fn test_invalid_manager() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());
    let employee = create_user(&db, "Jim", Role::Employee).await;

    let result = repo
        .update_user(
            uid(&employee),
            UpdateUserInput {
                manager_id: Some(Some(uid(&employee))),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(UserError::InvalidManager(_))));

    let result = repo
        .update_user(
            uid(&employee),
            UpdateUserInput {
                manager_id: Some(Some(UserId::new())),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(UserError::InvalidManager(_))));
}

#[tokio::test]
async fn test_delete_user_clears_reports_manager() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());

    let manager = create_user(&db, "Michael", Role::Manager).await;
    let report = repo
        .create_user(CreateUserInput {
            name: "Pam".to_string(),
            email: "pam@company.com".to_string(),
            role: Role::Employee,
            manager_id: Some(uid(&manager)),
        })
        .await
        .unwrap();

    repo.delete_user(uid(&manager)).await.unwrap();

    assert!(matches!(
        repo.get_user(uid(&manager)).await,
        Err(UserError::NotFound(_))
    ));
    let report = repo.get_user(uid(&report)).await.unwrap();
    assert_eq!(report.manager_id, None);
}

#[tokio::test]
async fn test_delete_approver_is_blocked() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());
    let rules = ApprovalRuleRepository::new(db.clone());

    let approver = create_user(&db, "Angela", Role::Manager).await;
    let rule = rules.create_rule("Default", dec!(0)).await.unwrap();
    rules
        .add_step(ApprovalRuleId::from_uuid(rule.rule.id), uid(&approver))
        .await
        .unwrap();

    let result = repo.delete_user(uid(&approver)).await;
    assert!(matches!(result, Err(UserError::ApproverInUse(id)) if id == uid(&approver)));

    let rule = rules
        .get_rule(ApprovalRuleId::from_uuid(rule.rule.id))
        .await
        .unwrap();
    assert_eq!(rule.steps.len(), 1);
}

#[tokio::test]
async fn test_delete_user_with_expenses_is_blocked() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());
    let workflow = WorkflowRepository::new(db.clone());

    let employee = create_user(&db, "Jim", Role::Employee).await;
    workflow
        .submit(uid(&employee), expense(dec!(10), "INR"))
        .await
        .unwrap();

    let result = repo.delete_user(uid(&employee)).await;
    assert!(matches!(result, Err(UserError::HasExpenses(_))));
}

#[tokio::test]
async fn test_list_users_by_name() {
    let db = setup_db().await;
    let repo = UserRepository::new(db.clone());

    create_user(&db, "Oscar", Role::Employee).await;
    create_user(&db, "Angela", Role::Manager).await;
    create_admin(&db).await;

    let names: Vec<_> = repo
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["Admin", "Angela", "Oscar"]);
}
