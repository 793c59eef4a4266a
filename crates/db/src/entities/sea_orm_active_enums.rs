//! Enums stored as strings, with conversions to the core domain types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use expenseflow_core::user::Role;
use expenseflow_core::workflow::{ExpenseStatus as CoreStatus, LogAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    #[sea_orm(string_value = "EMPLOYEE")]
    Employee,
    #[sea_orm(string_value = "MANAGER")]
    Manager,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ExpenseLogAction {
    #[sea_orm(string_value = "SUBMITTED")]
    Submitted,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "AUTO-APPROVED")]
    AutoApproved,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Employee => Self::Employee,
            UserRole::Manager => Self::Manager,
            UserRole::Admin => Self::Admin,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Employee => Self::Employee,
            Role::Manager => Self::Manager,
            Role::Admin => Self::Admin,
        }
    }
}

impl From<ExpenseStatus> for CoreStatus {
    fn from(status: ExpenseStatus) -> Self {
        match status {
            ExpenseStatus::Pending => Self::Pending,
            ExpenseStatus::Approved => Self::Approved,
            ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<CoreStatus> for ExpenseStatus {
    fn from(status: CoreStatus) -> Self {
        match status {
            CoreStatus::Pending => Self::Pending,
            CoreStatus::Approved => Self::Approved,
            CoreStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ExpenseLogAction> for LogAction {
    fn from(action: ExpenseLogAction) -> Self {
        match action {
            ExpenseLogAction::Submitted => Self::Submitted,
            ExpenseLogAction::Approved => Self::Approved,
            ExpenseLogAction::Rejected => Self::Rejected,
            ExpenseLogAction::AutoApproved => Self::AutoApproved,
        }
    }
}

impl From<LogAction> for ExpenseLogAction {
    fn from(action: LogAction) -> Self {
        match action {
            LogAction::Submitted => Self::Submitted,
            LogAction::Approved => Self::Approved,
            LogAction::Rejected => Self::Rejected,
            LogAction::AutoApproved => Self::AutoApproved,
        }
    }
}
