use crate::common::errors::{ReliefError, ReliefResult};
use crate::common::reference::ReferenceId;

use super::capability::Operation;
use super::identity::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Authorized,
    Unauthorized,
    Unauthenticated,
}

impl Decision {
    pub fn into_result(self, operation: Operation) -> ReliefResult<()> {
        match self {
            Decision::Authorized => Ok(()),
            Decision::Unauthorized => Err(ReliefError::unauthorized(format!(
                "role may not perform {}",
                operation
            ))),
            Decision::Unauthenticated => Err(ReliefError::Unauthenticated(format!(
                "{} requires a signed-in caller",
                operation
            ))),
        }
    }
}

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn decide(identity: Option<&Identity>, operation: Operation) -> Decision {
        match identity {
            None => Decision::Unauthenticated,
            Some(identity) if operation.permits(identity.role) => Decision::Authorized,
            Some(_) => Decision::Unauthorized,
        }
    }

    /// Account protection for role changes and deletions.
    ///
    /// Applies on top of `ManageUsers`: nobody touches their own account this
    /// way, and admin accounts are never a valid target.
    pub fn ensure_may_manage(
        actor: &Identity,
        target: &ReferenceId,
        target_role: Role,
    ) -> ReliefResult<()> {
        if &actor.reference == target {
            return Err(ReliefError::unauthorized(
                "cannot change or delete your own account",
            ));
        }
        if target_role == Role::Admin {
            return Err(ReliefError::unauthorized("admin accounts cannot be modified"));
        }
        Ok(())
    }
}
