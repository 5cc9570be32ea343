//! Authorization
//!
//! Role-based access checks applied after the bearer-token gate.

use crate::shared::error::{AdmissionsError, Result};
use crate::user::entity::{Role, User};

/// Authorization context for a request: the resolved caller identity.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Account id
    pub user_id: String,

    /// Username (teacher-match keys on student records use this)
    pub username: String,

    /// Account email
    pub email: String,

    /// Account role
    pub role: Role,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Common authorization checks
pub mod checks {
    use super::*;

    /// Require the caller's role to be in the allow-set.
    /// Pure predicate: no side effects, 403 on miss.
    pub fn require_role(context: &AuthContext, allowed: &[Role]) -> Result<()> {
        if allowed.contains(&context.role) {
            Ok(())
        } else {
            Err(AdmissionsError::forbidden(
                "You do not have permission to perform this action",
            ))
        }
    }
}
