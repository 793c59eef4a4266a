//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use expenseflow_core::workflow::MONEY_SCALE;

use super::sea_orm_active_enums::ExpenseStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub employee_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub expense_date: DateTimeWithTimeZone,
    pub status: ExpenseStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::EmployeeId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Users,
    #[sea_orm(has_many = "super::expense_logs::Entity")]
    ExpenseLogs,
    #[sea_orm(has_one = "super::active_approvals::Entity")]
    ActiveApprovals,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::expense_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseLogs.def()
    }
}

impl Related<super::active_approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActiveApprovals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rounds `amount` back to the column scale.
    ///
    /// SQLite keeps decimals as REAL, so a value read back can carry binary
    /// noise past the last stored decimal place.
    #[must_use]
    pub fn canonical(mut self) -> Self {
        self.amount = self.amount.round_dp(MONEY_SCALE).normalize();
        self
    }
}
