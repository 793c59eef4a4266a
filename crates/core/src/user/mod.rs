//! User roles and the single-admin invariant.
//!
//! Exactly one ADMIN exists. It is created once (by bootstrap) and can be
//! neither demoted nor deleted; nobody else can be promoted to it. Managers
//! are weak back-references: an id that must resolve, never the user itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use expenseflow_shared::types::UserId;

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Submits expenses.
    Employee,
    /// Manages employees; may be assigned as an approver.
    Manager,
    /// The single administrator.
    Admin,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "EMPLOYEE",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parses a role from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EMPLOYEE" => Some(Self::Employee),
            "MANAGER" => Some(Self::Manager),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Violation of a user-role invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPolicyViolation {
    /// The change would create, remove, promote to or demote the admin.
    #[error("{0}")]
    AdminProtected(&'static str),

    /// The manager reference is the user itself.
    #[error("a user cannot be their own manager")]
    SelfManager,
}

/// Stateless checks on user mutations.
pub struct UserPolicy;

impl UserPolicy {
    /// Checks that a new user may be created with `role`.
    ///
    /// Only bootstrap creates the admin, so `Admin` is always refused here.
    pub fn check_create(role: Role) -> Result<(), UserPolicyViolation> {
        if role == Role::Admin {
            return Err(UserPolicyViolation::AdminProtected(
                "only one ADMIN may exist",
            ));
        }
        Ok(())
    }

    /// Checks a role change from `current` to `requested`.
    pub fn check_role_change(current: Role, requested: Role) -> Result<(), UserPolicyViolation> {
        match (current, requested) {
            (Role::Admin, Role::Admin) => Ok(()),
            (Role::Admin, _) => Err(UserPolicyViolation::AdminProtected(
                "the ADMIN cannot be demoted",
            )),
            (_, Role::Admin) => Err(UserPolicyViolation::AdminProtected(
                "only one ADMIN may exist",
            )),
            _ => Ok(()),
        }
    }

    /// Checks that a user holding `role` may be deleted.
    pub fn check_delete(role: Role) -> Result<(), UserPolicyViolation> {
        if role == Role::Admin {
            return Err(UserPolicyViolation::AdminProtected(
                "the ADMIN cannot be deleted",
            ));
        }
        Ok(())
    }

    /// Checks a manager reference for `user_id`. Existence is checked by the caller.
    pub fn check_manager(
        user_id: Option<UserId>,
        manager_id: UserId,
    ) -> Result<(), UserPolicyViolation> {
        if user_id == Some(manager_id) {
            return Err(UserPolicyViolation::SelfManager);
        }
        Ok(())
    }
}
