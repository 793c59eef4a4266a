//! End-to-end tests driving the router in-process.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use expenseflow_api::{AppState, create_router, middleware::USER_ID_HEADER};
use expenseflow_core::currency::StaticRateTable;
use expenseflow_core::user::Role;
use expenseflow_db::entities::users;
use expenseflow_db::repositories::CreateUserInput;
use expenseflow_db::{UserRepository, connect, migrate};
use expenseflow_shared::{DatabaseConfig, FileSink, NotificationDispatcher};

struct TestApp {
    router: Router,
    admin: users::Model,
    manager: users::Model,
    employee: users::Model,
    log_path: PathBuf,
    _dir: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let db = connect(&DatabaseConfig::with_url("sqlite::memory:"))
        .await
        .expect("connect");
    migrate(&db).await.expect("migrate");

    let users = UserRepository::new(db.clone());
    let admin = users
        .ensure_admin("Michael Scott", "admin@company.com")
        .await
        .unwrap();
    let manager = users
        .create_user(CreateUserInput {
            name: "Angela Martin".to_string(),
            email: "angela@company.com".to_string(),
            role: Role::Manager,
            manager_id: None,
        })
        .await
        .unwrap();
    let employee = users
        .create_user(CreateUserInput {
            name: "Dwight Schrute".to_string(),
            email: "dwight@company.com".to_string(),
            role: Role::Employee,
            manager_id: Some(expenseflow_shared::types::UserId::from_uuid(manager.id)),
        })
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("notifications.log");
    let (notifier, _worker) = NotificationDispatcher::spawn(Arc::new(FileSink::new(&log_path)));

    let rates = StaticRateTable::new(
        "INR",
        [
            ("USD".to_string(), Decimal::from_str("83.50").unwrap()),
            ("EUR".to_string(), Decimal::from_str("90.25").unwrap()),
        ]
        .into_iter()
        .collect(),
    );

    let state = AppState {
        db: Arc::new(db),
        notifier,
        rates: Arc::new(rates),
        admin_recipient: "admin@company.com".to_string(),
    };

    TestApp {
        router: create_router(state),
        admin,
        manager,
        employee,
        log_path,
        _dir: dir,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    caller: Option<&users::Model>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = caller {
        builder = builder.header(USER_ID_HEADER, user.id.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn wait_for_lines(path: &Path, expected: usize) -> Vec<String> {
    for _ in 0..50 {
        if let Ok(content) = tokio::fs::read_to_string(path).await {
            let lines: Vec<String> = content.lines().map(str::to_string).collect();
            if lines.len() >= expected {
                return lines;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} notification lines in {}", path.display());
}

fn expense_body(amount: &str, currency: &str) -> Value {
    json!({
        "amount": amount,
        "currency": currency,
        "category": "Travel",
        "description": "Client visit",
        "date": "2026-10-01T09:00:00+00:00",
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_missing_or_unknown_identity_is_unauthorized() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/rules", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let request = Request::builder()
        .uri("/api/v1/rules")
        .header(USER_ID_HEADER, "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/rules")
        .header(USER_ID_HEADER, uuid::Uuid::now_v7().to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_catalog_mutations_require_admin() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rules",
        Some(&app.manager),
        Some(json!({ "name": "Standard", "min_amount": "100" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(&app.employee),
        Some(json!({ "name": "Jim", "email": "jim@company.com", "role": "EMPLOYEE" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_management() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(&app.admin),
        Some(json!({ "name": "Jim Halpert", "email": "jim@company.com", "role": "employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "EMPLOYEE");
    assert_eq!(body["manager_id"], Value::Null);
    let jim_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(&app.admin),
        Some(json!({ "name": "Boss", "email": "boss@company.com", "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ADMIN_PROTECTED");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(&app.admin),
        Some(json!({ "name": "Kevin", "email": "kevin@company.com", "role": "INTERN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/users/{jim_id}"),
        Some(&app.admin),
        Some(json!({ "role": "MANAGER", "manager_id": app.manager.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "MANAGER");
    assert_eq!(body["manager_id"], app.manager.id.to_string());

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/users/{jim_id}"),
        Some(&app.admin),
        Some(json!({ "manager_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "MANAGER");
    assert_eq!(body["manager_id"], Value::Null);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/users/{jim_id}"),
        Some(&app.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/users/{}", app.admin.id),
        Some(&app.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ADMIN_PROTECTED");

    let (status, body) = send(&app, Method::GET, "/api/v1/users", Some(&app.employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_submit_and_approve_through_single_step_rule() {
    let app = setup().await;

    let (status, rule) = send(
        &app,
        Method::POST,
        "/api/v1/rules",
        Some(&app.admin),
        Some(json!({ "name": "Standard", "min_amount": "100" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let rule_id = rule["id"].as_str().unwrap().to_string();

    let (status, rule) = send(
        &app,
        Method::POST,
        &format!("/api/v1/rules/{rule_id}/steps"),
        Some(&app.admin),
        Some(json!({ "approver_id": app.manager.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rule["steps"][0]["step_number"], 1);
    assert_eq!(rule["steps"][0]["approver"]["name"], "Angela Martin");

    let (status, submitted) = send(
        &app,
        Method::POST,
        "/api/v1/expenses",
        Some(&app.employee),
        Some(expense_body("200", "USD")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submitted["status"], "PENDING");
    assert_eq!(submitted["workflow"]["state"], "pending");
    assert_eq!(submitted["workflow"]["step_number"], 1);
    let expense_id = submitted["id"].as_str().unwrap().to_string();

    let (status, pending) = send(
        &app,
        Method::GET,
        "/api/v1/approvals/pending",
        Some(&app.manager),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], expense_id.as_str());
    assert_eq!(pending[0]["employee"]["name"], "Dwight Schrute");
    assert_eq!(pending[0]["step_number"], 1);
    assert_eq!(
        decimal(&pending[0]["amount_in_company_currency"]),
        Decimal::from(16700)
    );

    // Rule is pinned by the pending expense.
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/rules/{rule_id}"),
        Some(&app.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "RULE_IN_USE");

    let decision_uri = format!("/api/v1/approvals/{expense_id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &decision_uri,
        Some(&app.employee),
        Some(json!({ "status": "APPROVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, body) = send(
        &app,
        Method::PUT,
        &decision_uri,
        Some(&app.manager),
        Some(json!({ "status": "MAYBE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = send(
        &app,
        Method::PUT,
        &decision_uri,
        Some(&app.manager),
        Some(json!({ "status": "APPROVED", "comment": "Looks fine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["workflow"]["state"], "approved");

    let (status, body) = send(
        &app,
        Method::PUT,
        &decision_uri,
        Some(&app.manager),
        Some(json!({ "status": "REJECTED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NOT_PENDING");

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/api/v1/expenses/{expense_id}/history"),
        Some(&app.employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["action"], "SUBMITTED");
    assert_eq!(history[0]["user_name"], "Dwight Schrute");
    assert_eq!(history[1]["action"], "APPROVED");
    assert_eq!(history[1]["user_name"], "Angela Martin");
    assert_eq!(history[1]["comment"], "Looks fine");

    let (status, mine) = send(
        &app,
        Method::GET,
        "/api/v1/expenses/mine",
        Some(&app.employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["status"], "APPROVED");

    let lines = wait_for_lines(&app.log_path, 3).await;
    assert!(lines.contains(&format!(
        "Notification for admin@company.com: New expense #{expense_id} submitted."
    )));
    assert!(lines.contains(&format!(
        "Notification for angela@company.com: Expense #{expense_id} is awaiting your approval (step 1)."
    )));
    assert!(lines.contains(&format!(
        "Notification for dwight@company.com: Your expense #{expense_id} was approved."
    )));
}

#[tokio::test]
async fn test_submission_without_rule_is_auto_approved() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/expenses",
        Some(&app.employee),
        Some(expense_body("50", "INR")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["workflow"]["state"], "no_rule_auto_approved");

    let expense_id = body["id"].as_str().unwrap();
    let (_, history) = send(
        &app,
        Method::GET,
        &format!("/api/v1/expenses/{expense_id}/history"),
        Some(&app.employee),
        None,
    )
    .await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["action"], "AUTO-APPROVED");
    assert_eq!(history[1]["user_name"], "System");
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/expenses",
        Some(&app.employee),
        Some(expense_body("0", "USD")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/expenses",
        Some(&app.employee),
        Some(json!({ "amount": "10" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, mine) = send(
        &app,
        Method::GET,
        "/api/v1/expenses/mine",
        Some(&app.employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_of_unknown_expense_is_not_found() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/expenses/{}/history", uuid::Uuid::now_v7()),
        Some(&app.employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/expenses/not-a-uuid/history",
        Some(&app.employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
