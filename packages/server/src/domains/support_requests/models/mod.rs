pub mod support_request;

pub use support_request::{
    ReviewAction, SupportRequest, SupportRequestDetails, SupportRequestFilter, SupportRequestItem,
    SupportRequestItemDetails, SupportRequestStatus, SupportRequestWithItems,
};
