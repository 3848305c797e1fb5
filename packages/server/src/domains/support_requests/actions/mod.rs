//! Support request domain actions - business logic functions

mod create_support_request;
mod queries;
mod review_support_request;

pub use create_support_request::{create_support_request, NewSupportRequest, OfferedItem};
pub use queries::{list_own_support_requests, list_support_requests};
pub use review_support_request::{review_support_request, ReviewOutcome};
