use crate::common::errors::ReliefResult;

use super::capability::Operation;
use super::identity::Identity;
use super::policy::AccessPolicy;

/// Entry point for authorization checks
///
/// Usage:
/// ```
/// # use relief_core::common::auth::{Actor, Identity, Operation, Role};
/// # use relief_core::common::ReferenceId;
/// # let identity = Identity::new(ReferenceId::generate(), Role::Moderator);
/// Actor::new(&identity)
///     .can(Operation::ReviewSupportRequest)
///     .check()?;
/// # Ok::<(), relief_core::common::ReliefError>(())
/// ```
pub struct Actor<'a> {
    identity: Option<&'a Identity>,
}

impl<'a> Actor<'a> {
    pub fn new(identity: &'a Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// A caller that presented no valid credentials.
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    /// Specify what operation the actor wants to perform
    pub fn can(self, operation: Operation) -> CapabilityBuilder<'a> {
        CapabilityBuilder {
            identity: self.identity,
            operation,
        }
    }
}

/// Builder after specifying the operation
pub struct CapabilityBuilder<'a> {
    identity: Option<&'a Identity>,
    operation: Operation,
}

impl CapabilityBuilder<'_> {
    pub fn check(self) -> ReliefResult<()> {
        AccessPolicy::decide(self.identity, self.operation).into_result(self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::auth::Role;
    use crate::common::ReferenceId;

    #[test]
    fn moderator_may_review() {
        let identity = Identity::new(ReferenceId::generate(), Role::Moderator);
        assert!(Actor::new(&identity)
            .can(Operation::ReviewSupportRequest)
            .check()
            .is_ok());
    }

    #[test]
    fn user_may_not_review() {
        let identity = Identity::new(ReferenceId::generate(), Role::User);
        let err = Actor::new(&identity)
            .can(Operation::ReviewSupportRequest)
            .check()
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    #[test]
    fn anonymous_actor_is_unauthenticated() {
        let err = Actor::anonymous()
            .can(Operation::CreateHelpRequest)
            .check()
            .unwrap_err();
        assert_eq!(err.kind(), "unauthenticated");
    }
}
