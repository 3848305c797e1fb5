//! Access control for relief operations
//!
//! Every action consults one table keyed by [`Operation`] and [`Role`]:
//!
//! ```rust
//! use relief_core::common::auth::{Actor, Identity, Operation, Role};
//! use relief_core::common::ReferenceId;
//!
//! let caller = Identity::new(ReferenceId::generate(), Role::User);
//! assert!(Actor::new(&caller).can(Operation::CreateSupportRequest).check().is_ok());
//! assert!(Actor::new(&caller).can(Operation::ManageUsers).check().is_err());
//! ```

mod builder;
mod capability;
mod identity;
mod policy;

pub use builder::{Actor, CapabilityBuilder};
pub use capability::Operation;
pub use identity::{Identity, Role};
pub use policy::{AccessPolicy, Decision};
