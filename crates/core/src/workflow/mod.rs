//! Expense approval workflow.
//!
//! This module implements rule selection, the per-expense approval state
//! machine and the audit vocabulary written for every workflow action.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (ExpenseStatus, Decision, LogAction, WorkflowState)
//! - `error` - Workflow error taxonomy
//! - `approval` - Approval rules, steps and rule selection
//! - `service` - Submission and decision transitions

pub mod approval;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod approval_props;
#[cfg(test)]
mod service_props;

pub use approval::{ApprovalEngine, ApprovalRule, ApprovalStep};
pub use error::WorkflowError;
pub use service::{DecisionOutcome, MAX_MONEY, MONEY_SCALE, SubmissionPlan, WorkflowService};
pub use types::{
    Decision, ExpenseStatus, LogAction, NO_RULE_MATCHED_COMMENT, SYSTEM_ACTOR, WorkflowState,
};
