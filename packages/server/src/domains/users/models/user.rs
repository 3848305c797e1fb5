use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::time;
use crate::common::{Identity, ReferenceId, ReliefError, ReliefResult, Role, UserId};

/// A registered account.
///
/// `password_hash` is produced by the caller's credential layer and stored
/// as-is; it never serializes out.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub ref_id: ReferenceId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity::new(self.ref_id.clone(), self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub password_hash: String,
}

impl NewUser {
    pub fn validate(&self) -> ReliefResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone_number", &self.phone_number),
            ("password_hash", &self.password_hash),
        ] {
            if value.trim().is_empty() {
                return Err(ReliefError::Validation(format!("{} is required", field)));
            }
        }
        if !self.email.contains('@') {
            return Err(ReliefError::Validation(format!(
                "email address looks invalid: {}",
                self.email
            )));
        }
        Ok(())
    }

    /// Build the row for a freshly reserved reference id.
    pub fn into_user(self, ref_id: ReferenceId, role: Role) -> User {
        User {
            id: UserId::new(),
            ref_id,
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_lowercase(),
            phone_number: self.phone_number.trim().to_owned(),
            address: self
                .address
                .map(|a| a.trim().to_owned())
                .filter(|a| !a.is_empty()),
            password_hash: self.password_hash,
            role,
            created_at: time::now(),
        }
    }
}

/// Result of a role change, for callers that report what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub ref_id: ReferenceId,
    pub previous_role: Role,
    pub new_role: Role,
}
