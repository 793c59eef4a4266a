//! User repository for database operations.
//!
//! Role changes and deletions go through [`UserPolicy`] so the single ADMIN
//! can be neither duplicated nor removed.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use expenseflow_core::user::{Role, UserPolicy, UserPolicyViolation};
use expenseflow_shared::types::UserId;

use crate::entities::{
    approval_steps, expenses, sea_orm_active_enums::UserRole, users,
};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// User not found.
    #[error("User {0} not found")]
    NotFound(UserId),

    /// Email already registered.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// The change would break the single-admin invariant.
    #[error("Admin protected: {0}")]
    AdminProtected(String),

    /// The user is still assigned to an approval step.
    #[error("User {0} is an approver in at least one approval rule")]
    ApproverInUse(UserId),

    /// The user still owns expenses.
    #[error("User {0} has submitted expenses")]
    HasExpenses(UserId),

    /// The manager reference is invalid.
    #[error("Invalid manager: {0}")]
    InvalidManager(String),

    /// Malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl UserError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::InvalidManager(_) => 400,
            Self::NotFound(_) => 404,
            Self::DuplicateEmail(_)
            | Self::AdminProtected(_)
            | Self::ApproverInUse(_)
            | Self::HasExpenses(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Self::AdminProtected(_) => "ADMIN_PROTECTED",
            Self::ApproverInUse(_) => "APPROVER_IN_USE",
            Self::HasExpenses(_) => "HAS_EXPENSES",
            Self::InvalidManager(_) => "INVALID_MANAGER",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<UserPolicyViolation> for UserError {
    fn from(violation: UserPolicyViolation) -> Self {
        match violation {
            UserPolicyViolation::AdminProtected(reason) => Self::AdminProtected(reason.to_string()),
            UserPolicyViolation::SelfManager => Self::InvalidManager(violation.to_string()),
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Display name.
    pub name: String,
    /// Unique email, also the notification address.
    pub email: String,
    /// Role; `Admin` is refused.
    pub role: Role,
    /// Optional manager.
    pub manager_id: Option<UserId>,
}

/// Input for updating a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New role.
    pub role: Option<Role>,
    /// New manager; `Some(None)` clears it.
    pub manager_id: Option<Option<UserId>>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists all users ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_users(&self) -> Result<Vec<users::Model>, UserError> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Gets a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn get_user(&self, id: UserId) -> Result<users::Model, UserError> {
        self.find_by_id(id).await?.ok_or(UserError::NotFound(id))
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Creates a non-admin user.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `role` is `Admin` (`AdminProtected`)
    /// - Name or email is blank (`InvalidInput`)
    /// - The manager does not exist (`InvalidManager`)
    /// - The email is taken (`DuplicateEmail`)
    pub async fn create_user(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        UserPolicy::check_create(input.role)?;
        let (name, email) = validate_identity(&input.name, &input.email)?;

        if let Some(manager_id) = input.manager_id {
            self.ensure_manager_exists(manager_id).await?;
        }

        let user = insert_user(&self.db, name, email, input.role, input.manager_id).await?;
        info!(user_id = %user.id, role = %input.role, "User created");
        Ok(user)
    }

    /// Updates role and/or manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist, the role change touches
    /// the ADMIN, or the manager is the user itself or does not exist.
    pub async fn update_user(
        &self,
        user_id: UserId,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let existing = self.get_user(user_id).await?;
        let mut user: users::ActiveModel = existing.clone().into();

        if let Some(role) = input.role {
            UserPolicy::check_role_change(existing.role.into(), role)?;
            user.role = Set(role.into());
        }

        if let Some(manager_id) = input.manager_id {
            if let Some(manager_id) = manager_id {
                UserPolicy::check_manager(Some(user_id), manager_id)?;
                self.ensure_manager_exists(manager_id).await?;
            }
            user.manager_id = Set(manager_id.map(UserId::into_inner));
        }

        let updated = user.update(&self.db).await?;
        info!(user_id = %user_id, role = ?updated.role, manager_id = ?updated.manager_id, "User updated");
        Ok(updated)
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user does not exist (`NotFound`)
    /// - The user is the ADMIN (`AdminProtected`)
    /// - The user is an approver in any rule (`ApproverInUse`)
    /// - The user owns expenses (`HasExpenses`)
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), UserError> {
        let txn = self.db.begin().await?;

        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        UserPolicy::check_delete(user.role.into())?;

        let steps = approval_steps::Entity::find()
            .filter(approval_steps::Column::ApproverId.eq(user.id))
            .count(&txn)
            .await?;
        if steps > 0 {
            warn!(user_id = %user_id, steps, "Refused to delete approver referenced by rules");
            return Err(UserError::ApproverInUse(user_id));
        }

        let owned = expenses::Entity::find()
            .filter(expenses::Column::EmployeeId.eq(user.id))
            .count(&txn)
            .await?;
        if owned > 0 {
            return Err(UserError::HasExpenses(user_id));
        }

        // Reports keep existing; their manager reference is cleared.
        users::Entity::update_many()
            .col_expr(
                users::Column::ManagerId,
                sea_orm::sea_query::Expr::value(Option::<Uuid>::None),
            )
            .filter(users::Column::ManagerId.eq(user.id))
            .exec(&txn)
            .await?;

        users::Entity::delete_by_id(user.id).exec(&txn).await?;
        txn.commit().await?;

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Returns the ADMIN, creating it on first call.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` if no admin exists yet and `email` belongs to
    /// another user.
    pub async fn ensure_admin(&self, name: &str, email: &str) -> Result<users::Model, UserError> {
        if let Some(admin) = users::Entity::find()
            .filter(users::Column::Role.eq(UserRole::Admin))
            .one(&self.db)
            .await?
        {
            return Ok(admin);
        }

        let (name, email) = validate_identity(name, email)?;
        let admin = insert_user(&self.db, name, email, Role::Admin, None).await?;
        info!(user_id = %admin.id, "Admin user created");
        Ok(admin)
    }

    async fn ensure_manager_exists(&self, manager_id: UserId) -> Result<(), UserError> {
        if self.find_by_id(manager_id).await?.is_none() {
            return Err(UserError::InvalidManager(format!(
                "manager {manager_id} does not exist"
            )));
        }
        Ok(())
    }
}

fn validate_identity<'a>(name: &'a str, email: &'a str) -> Result<(&'a str, &'a str), UserError> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(UserError::InvalidInput("name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(UserError::InvalidInput(format!("invalid email '{email}'")));
    }
    Ok((name, email))
}

async fn insert_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
    manager_id: Option<UserId>,
) -> Result<users::Model, UserError> {
    let user = users::ActiveModel {
        id: Set(UserId::new().into_inner()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        role: Set(role.into()),
        manager_id: Set(manager_id.map(UserId::into_inner)),
        created_at: Set(Utc::now().into()),
    };

    user.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateEmail(email.to_string()),
        _ => UserError::Database(e),
    })
}
