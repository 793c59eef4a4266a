//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Workflow mutations run inside a single transaction each and call into
//! `expenseflow-core` for every decision.

pub mod approval_rule;
pub mod expense;
pub mod user;
pub mod workflow;

pub use approval_rule::{ApprovalRuleRepository, RuleWithSteps, StepWithApprover};
pub use expense::{ExpenseRepository, PendingExpense};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserRepository};
pub use workflow::{SubmitExpenseInput, WorkflowOutcome, WorkflowRepository};

use sea_orm::DbErr;

use expenseflow_core::workflow::WorkflowError;

/// Converts a storage failure into the workflow taxonomy.
pub(crate) fn database_error(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}
