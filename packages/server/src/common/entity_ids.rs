//! Typed ids for every persisted relief entity.
//!
//! ```rust
//! use relief_core::common::{HelpRequestId, SupportRequestId};
//!
//! let help_request_id = HelpRequestId::new();
//! let support_request_id = SupportRequestId::new();
//! // let wrong: HelpRequestId = support_request_id; // does not compile
//! # let _ = (help_request_id, support_request_id);
//! ```

pub use super::id::Id;

// Entity markers. Never constructed; they only tag `Id<T>`.

pub struct UserEntity;
pub struct HelpRequestEntity;
pub struct RequestItemEntity;
pub struct SupportRequestEntity;
pub struct SupportRequestItemEntity;
pub struct TrackingEntryEntity;
pub struct ActivityEntryEntity;

pub type UserId = Id<UserEntity>;
pub type HelpRequestId = Id<HelpRequestEntity>;
pub type RequestItemId = Id<RequestItemEntity>;
pub type SupportRequestId = Id<SupportRequestEntity>;
pub type SupportRequestItemId = Id<SupportRequestItemEntity>;
pub type TrackingEntryId = Id<TrackingEntryEntity>;
pub type ActivityEntryId = Id<ActivityEntryEntity>;
