//! Initial database migration.
//!
//! Creates users, the rule catalog, expenses, the audit log and the active
//! approval pointers.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Money column with four fractional digits.
///
/// SQLite caps decimal precision at 16, Postgres gets `NUMERIC(19, 4)`.
fn money_column(manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
    let precision = match manager.get_database_backend() {
        DbBackend::Sqlite => 16,
        _ => 19,
    };
    ColumnDef::new(column).decimal_len(precision, 4).not_null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // USERS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Users::ManagerId).uuid().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_manager")
                            .from(Users::Table, Users::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // RULE CATALOG
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ApprovalRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(money_column(manager, ApprovalRules::MinAmount))
                    .col(
                        ColumnDef::new(ApprovalRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ApprovalSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalSteps::RuleId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalSteps::ApproverId).uuid().not_null())
                    .col(
                        ColumnDef::new(ApprovalSteps::StepNumber)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_steps_rule")
                            .from(ApprovalSteps::Table, ApprovalSteps::RuleId)
                            .to(ApprovalRules::Table, ApprovalRules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approval_steps_approver")
                            .from(ApprovalSteps::Table, ApprovalSteps::ApproverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Step positions are unique within a rule
        manager
            .create_index(
                Index::create()
                    .name("idx_approval_steps_rule_number")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::RuleId)
                    .col(ApprovalSteps::StepNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_steps_approver")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::ApproverId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // EXPENSES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::EmployeeId).uuid().not_null())
                    .col(money_column(manager, Expenses::Amount))
                    .col(ColumnDef::new(Expenses::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).text().not_null())
                    .col(
                        ColumnDef::new(Expenses::ExpenseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_employee")
                            .from(Expenses::Table, Expenses::EmployeeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_employee")
                    .table(Expenses::Table)
                    .col(Expenses::EmployeeId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // AUDIT LOG
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ExpenseLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseLogs::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseLogs::ActorName).string().not_null())
                    .col(ColumnDef::new(ExpenseLogs::Action).string_len(16).not_null())
                    .col(ColumnDef::new(ExpenseLogs::Comment).text().null())
                    .col(
                        ColumnDef::new(ExpenseLogs::LoggedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_logs_expense")
                            .from(ExpenseLogs::Table, ExpenseLogs::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_logs_expense_time")
                    .table(ExpenseLogs::Table)
                    .col(ExpenseLogs::ExpenseId)
                    .col(ExpenseLogs::LoggedAt)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // ACTIVE APPROVALS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ActiveApprovals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActiveApprovals::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActiveApprovals::ExpenseId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ActiveApprovals::CurrentStepId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActiveApprovals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_active_approvals_expense")
                            .from(ActiveApprovals::Table, ActiveApprovals::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_active_approvals_step")
                            .from(ActiveApprovals::Table, ActiveApprovals::CurrentStepId)
                            .to(ApprovalSteps::Table, ApprovalSteps::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_active_approvals_step")
                    .table(ActiveApprovals::Table)
                    .col(ActiveApprovals::CurrentStepId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActiveApprovals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalRules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    Role,
    ManagerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ApprovalRules {
    Table,
    Id,
    Name,
    MinAmount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ApprovalSteps {
    Table,
    Id,
    RuleId,
    ApproverId,
    StepNumber,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    EmployeeId,
    Amount,
    Currency,
    Category,
    Description,
    ExpenseDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExpenseLogs {
    Table,
    Id,
    ExpenseId,
    ActorName,
    Action,
    Comment,
    LoggedAt,
}

#[derive(DeriveIden)]
enum ActiveApprovals {
    Table,
    Id,
    ExpenseId,
    CurrentStepId,
    UpdatedAt,
}
