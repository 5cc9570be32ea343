//! User Entity
//!
//! Staff accounts: counsellors conduct intake and interviews, teachers grade
//! the evaluation tracks, admins manage records.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Counsellor,
    Teacher,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Counsellor
    }
}

/// Staff account entity
///
/// Accounts are immutable after registration; there is no update operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique, alphabetic only
    pub username: String,

    /// Unique, exactly 10 digits
    pub phone_number: String,

    /// Unique, lowercased, must carry the institution's domain suffix
    pub email: String,

    /// Argon2id PHC hash; excluded from every API response
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            username: username.into(),
            phone_number: phone_number.into(),
            email: email.into().to_lowercase(),
            password_hash: password_hash.into(),
            role,
            created_at: Utc::now(),
        }
    }

    pub fn is_counsellor(&self) -> bool {
        self.role == Role::Counsellor
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_lowercases_email() {
        let user = User::new("asha", "9876543210", "Asha@KRMU.edu.in", "hash", Role::Counsellor);
        assert_eq!(user.email, "asha@krmu.edu.in");
        assert_eq!(user.id.len(), 13);
    }

    #[test]
    fn test_default_role_is_counsellor() {
        assert_eq!(Role::default(), Role::Counsellor);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::Counsellor).unwrap(), "\"counsellor\"");
    }
}
