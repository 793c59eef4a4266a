//! Workflow domain types for expense lifecycle management.
//!
//! This module defines the statuses an expense moves through, the decisions
//! an approver can take, and the labels written to the audit log.

use serde::{Deserialize, Serialize};
use std::fmt;

use expenseflow_shared::types::{ApprovalRuleId, ApprovalStepId};

/// Actor name recorded for entries the engine writes on its own behalf.
pub const SYSTEM_ACTOR: &str = "System";

/// Comment attached to the `AUTO-APPROVED` entry when no rule applies.
pub const NO_RULE_MATCHED_COMMENT: &str = "No approval rule matched.";

/// Expense status as stored on the expense row.
///
/// The valid transitions are:
/// - Pending → Approved (last step approved, or no rule applies)
/// - Pending → Rejected (any step rejected)
///
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseStatus {
    /// Awaiting a decision from the current step's approver.
    Pending,
    /// Fully approved.
    Approved,
    /// Rejected at some step.
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decision taken by the approver of the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Pass the expense on to the next step (or finish it).
    Approved,
    /// Stop the workflow and reject the expense.
    Rejected,
}

impl Decision {
    /// Parses a decision from a string (case-insensitive).
    ///
    /// `PENDING` is a valid status but not a valid decision.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the string representation of the decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Audit label written when this decision is applied.
    #[must_use]
    pub fn log_action(&self) -> LogAction {
        match self {
            Self::Approved => LogAction::Approved,
            Self::Rejected => LogAction::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit log action label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogAction {
    /// Expense entered the workflow.
    #[serde(rename = "SUBMITTED")]
    Submitted,
    /// A step approver approved.
    #[serde(rename = "APPROVED")]
    Approved,
    /// A step approver rejected.
    #[serde(rename = "REJECTED")]
    Rejected,
    /// No rule applied, the engine approved on submission.
    #[serde(rename = "AUTO-APPROVED")]
    AutoApproved,
}

impl LogAction {
    /// Returns the label stored in the audit log.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::AutoApproved => "AUTO-APPROVED",
        }
    }

    /// Parses a stored label.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "AUTO-APPROVED" => Some(Self::AutoApproved),
            _ => None,
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an expense sits in the workflow after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    /// No rule applied at submission; approved immediately.
    NoRuleAutoApproved,
    /// Waiting on the approver of `step_number` within `rule_id`.
    Pending {
        /// Rule pinned at submission.
        rule_id: ApprovalRuleId,
        /// Step currently awaiting a decision.
        step_id: ApprovalStepId,
        /// 1-based position of that step.
        step_number: i32,
    },
    /// Every step approved.
    Approved,
    /// Rejected at some step.
    Rejected,
}

impl WorkflowState {
    /// Returns the expense status matching this state.
    #[must_use]
    pub fn status(&self) -> ExpenseStatus {
        match self {
            Self::NoRuleAutoApproved | Self::Approved => ExpenseStatus::Approved,
            Self::Pending { .. } => ExpenseStatus::Pending,
            Self::Rejected => ExpenseStatus::Rejected,
        }
    }
}
