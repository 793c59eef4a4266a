//! Workflow repository for expense state transitions.
//!
//! `submit` and `decide` each run as one transaction: the expense row, the
//! audit entries and the active-approval pointer commit together or not at
//! all. Notifications are only collected here; the caller dispatches them
//! after the commit.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info, warn};

use expenseflow_core::workflow::{
    Decision, DecisionOutcome, ExpenseStatus as CoreStatus, LogAction, NO_RULE_MATCHED_COMMENT,
    SYSTEM_ACTOR, SubmissionPlan, WorkflowError, WorkflowService, WorkflowState,
};
use expenseflow_shared::Notification;
use expenseflow_shared::types::{ExpenseId, UserId};

use crate::entities::{
    active_approvals, approval_steps, expense_logs, expenses,
    sea_orm_active_enums::{ExpenseLogAction, ExpenseStatus},
    users,
};

use super::approval_rule::{load_catalog, step_from_model};
use super::database_error;

/// Input for submitting an expense.
#[derive(Debug, Clone)]
pub struct SubmitExpenseInput {
    /// Amount in `currency`, must be positive.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Expense category.
    pub category: String,
    /// Free-text description.
    pub description: String,
    /// Date the expense was incurred.
    pub expense_date: DateTime<FixedOffset>,
}

/// Result of a committed workflow transition.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    /// Expense after the transition.
    pub expense: expenses::Model,
    /// Workflow state after the transition.
    pub state: WorkflowState,
    /// Messages for the parties affected by the transition.
    pub notifications: Vec<Notification>,
}

/// Workflow repository for expense state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits an expense and routes it to the applicable rule.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive or the currency code is malformed
    /// - The submitter does not exist
    /// - Database operation fails
    pub async fn submit(
        &self,
        submitter_id: UserId,
        input: SubmitExpenseInput,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        WorkflowService::validate_amount(input.amount)?;
        let currency = WorkflowService::normalize_currency(&input.currency)?;

        let txn = self.db.begin().await.map_err(database_error)?;

        let submitter = find_user(&txn, submitter_id.into_inner()).await?;

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(ExpenseId::new().into_inner()),
            employee_id: Set(submitter.id),
            amount: Set(input.amount),
            currency: Set(currency),
            category: Set(input.category),
            description: Set(input.description),
            expense_date: Set(input.expense_date),
            status: Set(ExpenseStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(database_error)?
        .canonical();

        append_log(&txn, expense.id, &submitter.name, LogAction::Submitted, None).await?;

        let catalog = load_catalog(&txn).await?;
        let plan = WorkflowService::plan_submission(&catalog, input.amount);

        let mut notifications = Vec::new();
        let expense = match plan {
            SubmissionPlan::AwaitApproval { step } => {
                active_approvals::ActiveModel {
                    id: Set(uuid::Uuid::now_v7()),
                    expense_id: Set(expense.id),
                    current_step_id: Set(step.id.into_inner()),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(database_error)?;

                let approver = find_user(&txn, step.approver_id.into_inner()).await?;
                notifications.push(awaiting_notification(&approver, expense.id, step.step_number));
                expense
            }
            SubmissionPlan::AutoApprove => {
                append_log(
                    &txn,
                    expense.id,
                    SYSTEM_ACTOR,
                    LogAction::AutoApproved,
                    Some(NO_RULE_MATCHED_COMMENT.to_string()),
                )
                .await?;
                notifications.push(final_notification(&submitter, expense.id, CoreStatus::Approved));
                set_status(&txn, expense, CoreStatus::Approved).await?
            }
        };

        txn.commit().await.map_err(database_error)?;

        let state = plan.state();
        info!(
            expense_id = %expense.id,
            submitter_id = %submitter_id,
            amount = %expense.amount,
            currency = %expense.currency,
            state = ?state,
            "Expense submitted"
        );

        Ok(WorkflowOutcome {
            expense,
            state,
            notifications,
        })
    }

    /// Applies a decision by the approver of the current step.
    ///
    /// The pointer is moved with a compare-and-set on the step it was read
    /// at; if a concurrent decision got there first nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expense has no active approval (`NotPending`)
    /// - `approver_id` is not the current step's approver (`Forbidden`)
    /// - A concurrent decision moved the expense first (`Conflict`)
    /// - Database operation fails
    pub async fn decide(
        &self,
        expense_id: ExpenseId,
        approver_id: UserId,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let txn = self.db.begin().await.map_err(database_error)?;

        let active = active_approvals::Entity::find()
            .filter(active_approvals::Column::ExpenseId.eq(expense_id.into_inner()))
            .one(&txn)
            .await
            .map_err(database_error)?
            .ok_or(WorkflowError::NotPending(expense_id))?;

        let current = approval_steps::Entity::find_by_id(active.current_step_id)
            .one(&txn)
            .await
            .map_err(database_error)?
            .ok_or_else(|| WorkflowError::not_found("Approval step", active.current_step_id))?;

        let rule_steps: Vec<_> = approval_steps::Entity::find()
            .filter(approval_steps::Column::RuleId.eq(current.rule_id))
            .order_by_asc(approval_steps::Column::StepNumber)
            .all(&txn)
            .await
            .map_err(database_error)?
            .iter()
            .map(step_from_model)
            .collect();

        let outcome = WorkflowService::decide(
            &step_from_model(&current),
            &rule_steps,
            approver_id,
            decision,
        )
        .inspect_err(|_| {
            warn!(
                expense_id = %expense_id,
                approver_id = %approver_id,
                step_number = current.step_number,
                "Decision by non-current approver refused"
            );
        })?;

        let approver = find_user(&txn, approver_id.into_inner()).await?;
        append_log(
            &txn,
            expense_id.into_inner(),
            &approver.name,
            decision.log_action(),
            comment,
        )
        .await?;

        let expense = expenses::Entity::find_by_id(expense_id.into_inner())
            .one(&txn)
            .await
            .map_err(database_error)?
            .ok_or_else(|| WorkflowError::not_found("Expense", expense_id))?
            .canonical();

        let mut notifications = Vec::new();
        let expense = match outcome {
            DecisionOutcome::Advance { next } => {
                let moved = active_approvals::Entity::update_many()
                    .col_expr(
                        active_approvals::Column::CurrentStepId,
                        Expr::value(next.id.into_inner()),
                    )
                    .col_expr(
                        active_approvals::Column::UpdatedAt,
                        Expr::value(DateTime::<FixedOffset>::from(Utc::now())),
                    )
                    .filter(active_approvals::Column::Id.eq(active.id))
                    .filter(active_approvals::Column::CurrentStepId.eq(current.id))
                    .exec(&txn)
                    .await
                    .map_err(database_error)?;
                if moved.rows_affected == 0 {
                    return Err(lost_update(expense_id));
                }

                let next_approver = find_user(&txn, next.approver_id.into_inner()).await?;
                notifications.push(awaiting_notification(
                    &next_approver,
                    expense.id,
                    next.step_number,
                ));
                expense
            }
            DecisionOutcome::Finalize { status } => {
                let removed = active_approvals::Entity::delete_many()
                    .filter(active_approvals::Column::Id.eq(active.id))
                    .filter(active_approvals::Column::CurrentStepId.eq(current.id))
                    .exec(&txn)
                    .await
                    .map_err(database_error)?;
                if removed.rows_affected == 0 {
                    return Err(lost_update(expense_id));
                }

                let employee = find_user(&txn, expense.employee_id).await?;
                notifications.push(final_notification(&employee, expense.id, status));
                set_status(&txn, expense, status).await?
            }
        };

        txn.commit().await.map_err(database_error)?;

        let state = outcome.state();
        info!(
            expense_id = %expense_id,
            approver_id = %approver_id,
            decision = %decision,
            step_number = current.step_number,
            state = ?state,
            "Decision applied"
        );

        Ok(WorkflowOutcome {
            expense,
            state,
            notifications,
        })
    }
}

fn lost_update(expense_id: ExpenseId) -> WorkflowError {
    debug!(expense_id = %expense_id, "Active approval moved concurrently");
    WorkflowError::Conflict(expense_id)
}

async fn find_user<C>(conn: &C, user_id: uuid::Uuid) -> Result<users::Model, WorkflowError>
where
    C: ConnectionTrait,
{
    users::Entity::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(database_error)?
        .ok_or_else(|| WorkflowError::not_found("User", user_id))
}

async fn append_log<C>(
    conn: &C,
    expense_id: uuid::Uuid,
    actor_name: &str,
    action: LogAction,
    comment: Option<String>,
) -> Result<(), WorkflowError>
where
    C: ConnectionTrait,
{
    expense_logs::ActiveModel {
        id: Set(uuid::Uuid::now_v7()),
        expense_id: Set(expense_id),
        actor_name: Set(actor_name.to_string()),
        action: Set(ExpenseLogAction::from(action)),
        comment: Set(comment),
        logged_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(database_error)?;
    Ok(())
}

async fn set_status<C>(
    conn: &C,
    expense: expenses::Model,
    status: CoreStatus,
) -> Result<expenses::Model, WorkflowError>
where
    C: ConnectionTrait,
{
    let mut active: expenses::ActiveModel = expense.into();
    active.status = Set(ExpenseStatus::from(status));
    active.updated_at = Set(Utc::now().into());
    active
        .update(conn)
        .await
        .map(expenses::Model::canonical)
        .map_err(database_error)
}

fn awaiting_notification(
    approver: &users::Model,
    expense_id: uuid::Uuid,
    step_number: i32,
) -> Notification {
    Notification::new(
        approver.email.clone(),
        format!("Expense #{expense_id} is awaiting your approval (step {step_number})."),
    )
}

fn final_notification(
    employee: &users::Model,
    expense_id: uuid::Uuid,
    status: CoreStatus,
) -> Notification {
    Notification::new(
        employee.email.clone(),
        format!("Your expense #{expense_id} was {}.", status.as_str().to_lowercase()),
    )
}
