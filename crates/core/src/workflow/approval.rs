//! Approval rules and rule selection.
//!
//! A rule is a named minimum-amount threshold with an ordered list of steps,
//! one approver per step. Selection happens exactly once per expense, at
//! submission; the engine afterwards only follows step references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use expenseflow_shared::types::{ApprovalRuleId, ApprovalStepId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;

/// One position in a rule's approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Unique identifier for the step.
    pub id: ApprovalStepId,
    /// Rule this step belongs to.
    pub rule_id: ApprovalRuleId,
    /// User who decides at this step.
    pub approver_id: UserId,
    /// 1-based position, unique within the rule.
    pub step_number: i32,
}

/// An approval rule that applies to expenses at or above `min_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: ApprovalRuleId,
    /// Unique human-readable name.
    pub name: String,
    /// Minimum amount for this rule to apply (inclusive).
    pub min_amount: Decimal,
    /// Steps ordered by `step_number`.
    pub steps: Vec<ApprovalStep>,
}

impl ApprovalRule {
    /// Returns the step the chain starts at, if any.
    #[must_use]
    pub fn first_step(&self) -> Option<&ApprovalStep> {
        self.steps.iter().min_by_key(|s| s.step_number)
    }

    /// Returns true if the rule requires at least one approval.
    #[must_use]
    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }
}

/// Stateless engine for evaluating approval rules.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Selects the rule that governs an expense of `amount`.
    ///
    /// Among rules with `min_amount <= amount` the one with the highest
    /// threshold wins; equal thresholds fall back to the lowest rule id. A
    /// winning rule without steps requires no approval, so `None` is returned.
    #[must_use]
    pub fn find_applicable_rule(rules: &[ApprovalRule], amount: Decimal) -> Option<&ApprovalRule> {
        rules
            .iter()
            .filter(|r| r.min_amount <= amount)
            .max_by(|a, b| {
                a.min_amount
                    .cmp(&b.min_amount)
                    .then_with(|| b.id.cmp(&a.id))
            })
            .filter(|r| r.has_steps())
    }

    /// Returns the step at `step_number + 1` within the same rule.
    #[must_use]
    pub fn step_after(steps: &[ApprovalStep], current: &ApprovalStep) -> Option<ApprovalStep> {
        steps
            .iter()
            .find(|s| s.rule_id == current.rule_id && s.step_number == current.step_number + 1)
            .copied()
    }

    /// Position assigned to a step appended to a rule with `existing` steps.
    #[must_use]
    pub fn next_step_number(existing: usize) -> i32 {
        i32::try_from(existing).map_or(i32::MAX, |n| n.saturating_add(1))
    }

    /// Validates the inputs of a new rule.
    pub fn validate_rule(name: &str, min_amount: Decimal) -> Result<(), WorkflowError> {
        if name.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "rule name is required".to_string(),
            ));
        }
        if min_amount < Decimal::ZERO {
            return Err(WorkflowError::InvalidInput(
                "min_amount must be non-negative".to_string(),
            ));
        }
        WorkflowService::validate_money("min_amount", min_amount)
    }
}
