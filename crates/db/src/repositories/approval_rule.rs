//! Approval Rule Repository
//!
//! Rule catalog: named amount thresholds with ordered approval steps.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{info, warn};

use expenseflow_core::workflow::{
    ApprovalEngine, ApprovalRule, ApprovalStep, MONEY_SCALE, WorkflowError,
};
use expenseflow_shared::types::{ApprovalRuleId, ApprovalStepId, UserId};

use crate::entities::{active_approvals, approval_rules, approval_steps, users};

use super::database_error;

/// A step together with the approver it points at.
#[derive(Debug, Clone)]
pub struct StepWithApprover {
    /// Step data.
    pub step: approval_steps::Model,
    /// Approver of the step.
    pub approver: users::Model,
}

/// A rule with its steps ordered by `step_number`.
#[derive(Debug, Clone)]
pub struct RuleWithSteps {
    /// Rule data.
    pub rule: approval_rules::Model,
    /// Ordered steps.
    pub steps: Vec<StepWithApprover>,
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new approval rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a rule without steps.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is blank or `min_amount` is negative
    /// - A rule with the same name exists
    /// - Database operation fails
    pub async fn create_rule(
        &self,
        name: &str,
        min_amount: Decimal,
    ) -> Result<RuleWithSteps, WorkflowError> {
        let name = name.trim();
        ApprovalEngine::validate_rule(name, min_amount)?;

        let existing = approval_rules::Entity::find()
            .filter(approval_rules::Column::Name.eq(name))
            .count(&self.db)
            .await
            .map_err(database_error)?;
        if existing > 0 {
            return Err(WorkflowError::DuplicateName(name.to_string()));
        }

        let rule = approval_rules::ActiveModel {
            id: Set(ApprovalRuleId::new().into_inner()),
            name: Set(name.to_string()),
            min_amount: Set(min_amount),
            created_at: Set(Utc::now().into()),
        };

        let rule = rule.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                WorkflowError::DuplicateName(name.to_string())
            }
            _ => database_error(e),
        })?
        .canonical();

        info!(rule_id = %rule.id, name = %rule.name, min_amount = %rule.min_amount, "Approval rule created");

        Ok(RuleWithSteps {
            rule,
            steps: Vec::new(),
        })
    }

    /// Appends a step for `approver_id` at position `count + 1`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the rule or the approver does not exist.
    pub async fn add_step(
        &self,
        rule_id: ApprovalRuleId,
        approver_id: UserId,
    ) -> Result<RuleWithSteps, WorkflowError> {
        let txn = self.db.begin().await.map_err(database_error)?;

        approval_rules::Entity::find_by_id(rule_id.into_inner())
            .one(&txn)
            .await
            .map_err(database_error)?
            .ok_or_else(|| WorkflowError::not_found("Approval rule", rule_id))?;

        users::Entity::find_by_id(approver_id.into_inner())
            .one(&txn)
            .await
            .map_err(database_error)?
            .ok_or_else(|| WorkflowError::not_found("User", approver_id))?;

        let existing = approval_steps::Entity::find()
            .filter(approval_steps::Column::RuleId.eq(rule_id.into_inner()))
            .count(&txn)
            .await
            .map_err(database_error)?;
        let step_number =
            ApprovalEngine::next_step_number(usize::try_from(existing).unwrap_or(usize::MAX));

        let step = approval_steps::ActiveModel {
            id: Set(ApprovalStepId::new().into_inner()),
            rule_id: Set(rule_id.into_inner()),
            approver_id: Set(approver_id.into_inner()),
            step_number: Set(step_number),
        };
        step.insert(&txn).await.map_err(database_error)?;

        txn.commit().await.map_err(database_error)?;

        info!(rule_id = %rule_id, approver_id = %approver_id, step_number, "Approval step added");

        self.get_rule(rule_id).await
    }

    /// Deletes a rule and its steps.
    ///
    /// # Errors
    ///
    /// Returns `RuleInUse` while any active approval points at one of the
    /// rule's steps, `NotFound` if the rule does not exist.
    pub async fn delete_rule(&self, rule_id: ApprovalRuleId) -> Result<(), WorkflowError> {
        let txn = self.db.begin().await.map_err(database_error)?;

        approval_rules::Entity::find_by_id(rule_id.into_inner())
            .one(&txn)
            .await
            .map_err(database_error)?
            .ok_or_else(|| WorkflowError::not_found("Approval rule", rule_id))?;

        let step_ids: Vec<_> = approval_steps::Entity::find()
            .filter(approval_steps::Column::RuleId.eq(rule_id.into_inner()))
            .all(&txn)
            .await
            .map_err(database_error)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let in_use = active_approvals::Entity::find()
            .filter(active_approvals::Column::CurrentStepId.is_in(step_ids))
            .count(&txn)
            .await
            .map_err(database_error)?;
        if in_use > 0 {
            warn!(rule_id = %rule_id, active = in_use, "Rejected deletion of rule in use");
            return Err(WorkflowError::RuleInUse(rule_id));
        }

        let map_in_use = |e: sea_orm::DbErr| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => WorkflowError::RuleInUse(rule_id),
            _ => database_error(e),
        };

        approval_steps::Entity::delete_many()
            .filter(approval_steps::Column::RuleId.eq(rule_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(map_in_use)?;
        approval_rules::Entity::delete_by_id(rule_id.into_inner())
            .exec(&txn)
            .await
            .map_err(map_in_use)?;

        txn.commit().await.map_err(database_error)?;

        info!(rule_id = %rule_id, "Approval rule deleted");
        Ok(())
    }

    /// Lists all rules with their ordered steps and approvers.
    pub async fn list_rules(&self) -> Result<Vec<RuleWithSteps>, WorkflowError> {
        let rules = approval_rules::Entity::find()
            .order_by_asc(approval_rules::Column::MinAmount)
            .order_by_asc(approval_rules::Column::Name)
            .all(&self.db)
            .await
            .map_err(database_error)?;

        let steps = approval_steps::Entity::find()
            .order_by_asc(approval_steps::Column::StepNumber)
            .all(&self.db)
            .await
            .map_err(database_error)?;

        let approvers = self.approvers_of(&steps).await?;

        let mut by_rule: HashMap<_, Vec<StepWithApprover>> = HashMap::new();
        for step in steps {
            if let Some(approver) = approvers.get(&step.approver_id) {
                by_rule.entry(step.rule_id).or_default().push(StepWithApprover {
                    approver: approver.clone(),
                    step,
                });
            }
        }

        Ok(rules
            .into_iter()
            .map(|rule| {
                let steps = by_rule.remove(&rule.id).unwrap_or_default();
                RuleWithSteps {
                    rule: rule.canonical(),
                    steps,
                }
            })
            .collect())
    }

    /// Gets a rule with its ordered steps.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the rule does not exist.
    pub async fn get_rule(&self, rule_id: ApprovalRuleId) -> Result<RuleWithSteps, WorkflowError> {
        let rule = approval_rules::Entity::find_by_id(rule_id.into_inner())
            .one(&self.db)
            .await
            .map_err(database_error)?
            .ok_or_else(|| WorkflowError::not_found("Approval rule", rule_id))?
            .canonical();

        let steps = approval_steps::Entity::find()
            .filter(approval_steps::Column::RuleId.eq(rule.id))
            .order_by_asc(approval_steps::Column::StepNumber)
            .all(&self.db)
            .await
            .map_err(database_error)?;

        let approvers = self.approvers_of(&steps).await?;
        let steps = steps
            .into_iter()
            .filter_map(|step| {
                approvers.get(&step.approver_id).map(|approver| StepWithApprover {
                    approver: approver.clone(),
                    step,
                })
            })
            .collect();

        Ok(RuleWithSteps { rule, steps })
    }

    async fn approvers_of(
        &self,
        steps: &[approval_steps::Model],
    ) -> Result<HashMap<uuid::Uuid, users::Model>, WorkflowError> {
        let ids: Vec<_> = steps.iter().map(|s| s.approver_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let approvers = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(database_error)?;
        Ok(approvers.into_iter().map(|u| (u.id, u)).collect())
    }
}

/// Converts a step row into the core representation.
pub(crate) fn step_from_model(step: &approval_steps::Model) -> ApprovalStep {
    ApprovalStep {
        id: step.id.into(),
        rule_id: step.rule_id.into(),
        approver_id: step.approver_id.into(),
        step_number: step.step_number,
    }
}

/// Loads the whole catalog in core form, steps ordered by `step_number`.
///
/// Runs on the given connection so it can be part of a workflow transaction.
pub(crate) async fn load_catalog<C>(conn: &C) -> Result<Vec<ApprovalRule>, WorkflowError>
where
    C: ConnectionTrait,
{
    let rules = approval_rules::Entity::find()
        .all(conn)
        .await
        .map_err(database_error)?;
    let steps = approval_steps::Entity::find()
        .order_by_asc(approval_steps::Column::StepNumber)
        .all(conn)
        .await
        .map_err(database_error)?;

    let mut by_rule: HashMap<_, Vec<ApprovalStep>> = HashMap::new();
    for step in &steps {
        by_rule
            .entry(step.rule_id)
            .or_default()
            .push(step_from_model(step));
    }

    Ok(rules
        .into_iter()
        .map(|rule| ApprovalRule {
            id: rule.id.into(),
            steps: by_rule.remove(&rule.id).unwrap_or_default(),
            name: rule.name,
            min_amount: rule.min_amount.round_dp(MONEY_SCALE),
        })
        .collect())
}
