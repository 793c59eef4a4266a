//! Expense read projections.
//!
//! Pending approvals per approver, audit history per expense and the
//! expenses owned by an employee. Nothing here writes.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use expenseflow_core::currency::{CurrencyService, ExchangeRateProvider};
use expenseflow_core::workflow::WorkflowError;
use expenseflow_shared::types::{ExpenseId, UserId};

use crate::entities::{active_approvals, approval_steps, expense_logs, expenses, users};

use super::database_error;

/// An expense awaiting a decision from a given approver.
#[derive(Debug, Clone)]
pub struct PendingExpense {
    /// Expense data.
    pub expense: expenses::Model,
    /// Employee who submitted the expense.
    pub employee: Option<users::Model>,
    /// Position of the step awaiting the decision.
    pub step_number: i32,
    /// Amount in the reference currency.
    pub normalized_amount: Decimal,
}

/// Repository for expense queries.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists expenses whose current step is assigned to `approver_id`.
    ///
    /// Amounts are normalized through `rates`; a currency without a rate is
    /// passed through unchanged.
    pub async fn pending_for(
        &self,
        approver_id: UserId,
        rates: &dyn ExchangeRateProvider,
    ) -> Result<Vec<PendingExpense>, WorkflowError> {
        let steps: HashMap<_, _> = approval_steps::Entity::find()
            .filter(approval_steps::Column::ApproverId.eq(approver_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(database_error)?
            .into_iter()
            .map(|s| (s.id, s.step_number))
            .collect();
        if steps.is_empty() {
            return Ok(Vec::new());
        }

        let actives = active_approvals::Entity::find()
            .filter(active_approvals::Column::CurrentStepId.is_in(steps.keys().copied()))
            .all(&self.db)
            .await
            .map_err(database_error)?;
        if actives.is_empty() {
            return Ok(Vec::new());
        }

        let step_of_expense: HashMap<_, _> = actives
            .iter()
            .filter_map(|a| steps.get(&a.current_step_id).map(|n| (a.expense_id, *n)))
            .collect();

        let pending = expenses::Entity::find()
            .filter(expenses::Column::Id.is_in(step_of_expense.keys().copied()))
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(&self.db)
            .await
            .map_err(database_error)?
            .into_iter()
            .map(expenses::Model::canonical)
            .collect::<Vec<_>>();

        let employees: HashMap<_, _> = users::Entity::find()
            .filter(users::Column::Id.is_in(pending.iter().map(|e| e.employee_id)))
            .all(&self.db)
            .await
            .map_err(database_error)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(pending
            .into_iter()
            .map(|expense| PendingExpense {
                normalized_amount: CurrencyService::normalize(
                    expense.amount,
                    &expense.currency,
                    rates,
                ),
                employee: employees.get(&expense.employee_id).cloned(),
                step_number: step_of_expense.get(&expense.id).copied().unwrap_or_default(),
                expense,
            })
            .collect())
    }

    /// Returns the audit trail of an expense, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the expense does not exist.
    pub async fn history_for(
        &self,
        expense_id: ExpenseId,
    ) -> Result<Vec<expense_logs::Model>, WorkflowError> {
        self.get_expense(expense_id).await?;

        expense_logs::Entity::find()
            .filter(expense_logs::Column::ExpenseId.eq(expense_id.into_inner()))
            .order_by_asc(expense_logs::Column::LoggedAt)
            .order_by_asc(expense_logs::Column::Id)
            .all(&self.db)
            .await
            .map_err(database_error)
    }

    /// Lists the expenses owned by `employee_id`, most recent expense date first.
    pub async fn expenses_of(
        &self,
        employee_id: UserId,
    ) -> Result<Vec<expenses::Model>, WorkflowError> {
        expenses::Entity::find()
            .filter(expenses::Column::EmployeeId.eq(employee_id.into_inner()))
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(expenses::Model::canonical).collect())
            .map_err(database_error)
    }

    /// Gets a single expense.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the expense does not exist.
    pub async fn get_expense(&self, expense_id: ExpenseId) -> Result<expenses::Model, WorkflowError> {
        expenses::Entity::find_by_id(expense_id.into_inner())
            .one(&self.db)
            .await
            .map_err(database_error)?
            .map(expenses::Model::canonical)
            .ok_or_else(|| WorkflowError::not_found("Expense", expense_id))
    }
}
