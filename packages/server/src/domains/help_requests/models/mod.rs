pub mod help_request;
pub mod request_item;

pub use help_request::{HelpRequest, HelpRequestStatus, HelpRequestWithItems, Priority};
pub use request_item::RequestItem;
