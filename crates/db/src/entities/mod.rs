//! `SeaORM` entity definitions.

pub mod prelude;

pub mod active_approvals;
pub mod approval_rules;
pub mod approval_steps;
pub mod expense_logs;
pub mod expenses;
pub mod sea_orm_active_enums;
pub mod users;
