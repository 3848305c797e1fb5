//! Help request domain actions - business logic functions

mod create_help_request;
mod queries;

pub use create_help_request::{create_help_request, NewHelpRequest, NewRequestItem};
pub use queries::{get_help_request, list_own_help_requests, list_public_help_requests};
