//! Workflow error types for the expense approval lifecycle.
//!
//! Every failure the rule catalog and the workflow engine can surface to a
//! caller is one of these variants. They map one-to-one onto distinct API
//! responses.

use thiserror::Error;

use expenseflow_shared::types::{ApprovalRuleId, ExpenseId, UserId};

/// Errors that can occur during workflow and rule-catalog operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An entity id does not resolve.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The id that did not resolve.
        id: String,
    },

    /// A rule with this name already exists.
    #[error("Approval rule name '{0}' already exists")]
    DuplicateName(String),

    /// The rule is pinned by an expense that is still pending.
    #[error("Approval rule {0} is in use by an active expense")]
    RuleInUse(ApprovalRuleId),

    /// The expense has no active approval (terminal, or never existed).
    #[error("Expense {0} is not pending approval")]
    NotPending(ExpenseId),

    /// The caller is not the approver of the current step.
    #[error("User {user_id} is not the approver of the current step")]
    Forbidden {
        /// The user who attempted the decision.
        user_id: UserId,
    },

    /// Malformed or out-of-range input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A concurrent decision moved the expense first. Safe to retry.
    #[error("Expense {0} was modified concurrently, retry the decision")]
    Conflict(ExpenseId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Shorthand for [`WorkflowError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::DuplicateName(_)
            | Self::RuleInUse(_)
            | Self::NotPending(_)
            | Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::RuleInUse(_) => "RULE_IN_USE",
            Self::NotPending(_) => "NOT_PENDING",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let id = ExpenseId::new();
        let err = WorkflowError::not_found("Expense", id);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.to_string(), format!("Expense {id} not found"));
    }

    #[test]
    fn test_duplicate_name_error() {
        let err = WorkflowError::DuplicateName("Large expenses".to_string());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "DUPLICATE_NAME");
        assert!(err.to_string().contains("Large expenses"));
    }

    #[test]
    fn test_rule_in_use_error() {
        let err = WorkflowError::RuleInUse(ApprovalRuleId::new());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "RULE_IN_USE");
    }

    #[test]
    fn test_not_pending_error() {
        let err = WorkflowError::NotPending(ExpenseId::new());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "NOT_PENDING");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_forbidden_error() {
        let err = WorkflowError::Forbidden {
            user_id: UserId::new(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_invalid_input_error() {
        let err = WorkflowError::InvalidInput("amount must be positive".to_string());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_conflict_is_retryable() {
        let err = WorkflowError::Conflict(ExpenseId::new());
        assert_eq!(err.status_code(), 409);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_database_error() {
        let err = WorkflowError::Database("connection reset".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
