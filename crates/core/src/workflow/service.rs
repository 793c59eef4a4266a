//! Workflow service for expense state transitions.
//!
//! This module implements the core state machine: what a submission turns
//! into, and what a decision at the current step does. It never touches
//! storage; the persistence layer reads the inputs and writes the outcome
//! inside one transaction.

use rust_decimal::Decimal;

use expenseflow_shared::types::{ApprovalRuleId, UserId};

use crate::workflow::approval::{ApprovalEngine, ApprovalRule, ApprovalStep};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Decision, ExpenseStatus, WorkflowState};

/// Fractional digits kept for money values.
pub const MONEY_SCALE: u32 = 4;

/// Exclusive upper bound for money values.
///
/// Keeps every stored value within 15 significant digits, which SQLite's
/// REAL storage round-trips exactly.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0x4876_E800, 0x17, 0, false, 0);

/// What a freshly submitted expense turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// Create an active approval pointing at `step`.
    AwaitApproval {
        /// First step of the selected rule.
        step: ApprovalStep,
    },
    /// No rule applies: approve immediately.
    AutoApprove,
}

impl SubmissionPlan {
    /// Returns the workflow state after the plan is applied.
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        match self {
            Self::AwaitApproval { step } => WorkflowState::Pending {
                rule_id: step.rule_id,
                step_id: step.id,
                step_number: step.step_number,
            },
            Self::AutoApprove => WorkflowState::NoRuleAutoApproved,
        }
    }
}

/// What a decision at the current step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Move the active approval to `next`; the expense stays pending.
    Advance {
        /// Step that now awaits a decision.
        next: ApprovalStep,
    },
    /// Delete the active approval and set the terminal `status`.
    Finalize {
        /// `Approved` or `Rejected`.
        status: ExpenseStatus,
    },
}

impl DecisionOutcome {
    /// Returns the workflow state after the outcome is applied.
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        match self {
            Self::Advance { next } => WorkflowState::Pending {
                rule_id: next.rule_id,
                step_id: next.id,
                step_number: next.step_number,
            },
            Self::Finalize {
                status: ExpenseStatus::Rejected,
            } => WorkflowState::Rejected,
            Self::Finalize { .. } => WorkflowState::Approved,
        }
    }

    /// Returns the rule the expense remains pinned to, if still pending.
    #[must_use]
    pub fn pinned_rule(&self) -> Option<ApprovalRuleId> {
        match self {
            Self::Advance { next } => Some(next.rule_id),
            Self::Finalize { .. } => None,
        }
    }
}

/// Stateless service for expense workflow transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Validates a submitted amount.
    ///
    /// # Returns
    /// * `Err(WorkflowError::InvalidInput)` if the amount is zero or negative,
    ///   has more than [`MONEY_SCALE`] decimals or reaches [`MAX_MONEY`]
    pub fn validate_amount(amount: Decimal) -> Result<(), WorkflowError> {
        if amount <= Decimal::ZERO {
            return Err(WorkflowError::InvalidInput(
                "amount must be a positive number".to_string(),
            ));
        }
        Self::validate_money("amount", amount)
    }

    /// Checks that `value` fits a money column without rounding.
    pub fn validate_money(field: &str, value: Decimal) -> Result<(), WorkflowError> {
        if value.normalize().scale() > MONEY_SCALE {
            return Err(WorkflowError::InvalidInput(format!(
                "{field} must have at most {MONEY_SCALE} decimal places"
            )));
        }
        if value.abs() >= MAX_MONEY {
            return Err(WorkflowError::InvalidInput(format!(
                "{field} must be less than {MAX_MONEY}"
            )));
        }
        Ok(())
    }

    /// Validates and normalizes a currency code (trimmed, upper-cased, 3 letters).
    pub fn normalize_currency(code: &str) -> Result<String, WorkflowError> {
        let code = code.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(WorkflowError::InvalidInput(format!(
                "invalid currency code '{code}'"
            )));
        }
        Ok(code)
    }

    /// Decides what a submission of `amount` turns into, given the catalog.
    #[must_use]
    pub fn plan_submission(rules: &[ApprovalRule], amount: Decimal) -> SubmissionPlan {
        ApprovalEngine::find_applicable_rule(rules, amount)
            .and_then(ApprovalRule::first_step)
            .map_or(SubmissionPlan::AutoApprove, |step| {
                SubmissionPlan::AwaitApproval { step: *step }
            })
    }

    /// Applies a decision at the current step.
    ///
    /// # Arguments
    /// * `current` - The step the active approval points at
    /// * `rule_steps` - All steps of the rule `current` belongs to
    /// * `approver_id` - The user deciding
    /// * `decision` - Approve or reject
    ///
    /// # Returns
    /// * `Err(WorkflowError::Forbidden)` unless `approver_id` owns `current`
    /// * `Finalize { Rejected }` on rejection, regardless of remaining steps
    /// * `Advance` to the next step, or `Finalize { Approved }` after the last
    pub fn decide(
        current: &ApprovalStep,
        rule_steps: &[ApprovalStep],
        approver_id: UserId,
        decision: Decision,
    ) -> Result<DecisionOutcome, WorkflowError> {
        if current.approver_id != approver_id {
            return Err(WorkflowError::Forbidden {
                user_id: approver_id,
            });
        }

        Ok(match decision {
            Decision::Rejected => DecisionOutcome::Finalize {
                status: ExpenseStatus::Rejected,
            },
            Decision::Approved => match ApprovalEngine::step_after(rule_steps, current) {
                Some(next) => DecisionOutcome::Advance { next },
                None => DecisionOutcome::Finalize {
                    status: ExpenseStatus::Approved,
                },
            },
        })
    }
}
