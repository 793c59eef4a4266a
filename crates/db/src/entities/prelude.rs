//! Entity re-exports.

pub use super::active_approvals::Entity as ActiveApprovals;
pub use super::approval_rules::Entity as ApprovalRules;
pub use super::approval_steps::Entity as ApprovalSteps;
pub use super::expense_logs::Entity as ExpenseLogs;
pub use super::expenses::Entity as Expenses;
pub use super::users::Entity as Users;
