//! Support request domain - donor offers and their moderation
//!
//! pending -> accepted | rejected on review; accepted -> completed when the
//! logistics pipeline finishes.

pub mod actions;
pub mod models;

pub use actions::*;
pub use models::{
    ReviewAction, SupportRequest, SupportRequestDetails, SupportRequestFilter, SupportRequestItem,
    SupportRequestStatus, SupportRequestWithItems,
};
