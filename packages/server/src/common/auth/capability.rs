use std::fmt;

use super::identity::Role;

/// Operations guarded by the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Post a new help request
    CreateHelpRequest,

    /// See one's own help and support requests
    ViewOwnRequests,

    /// Offer items against a help request
    CreateSupportRequest,

    /// Browse every support request
    ListSupportRequests,

    /// Accept or reject a pending support request
    ReviewSupportRequest,

    /// Move an accepted support request along the logistics pipeline
    AdvanceLogistics,

    /// Read the logistics tracking history
    ViewLogisticsHistory,

    /// Read the activity log
    ViewActivityLogs,

    /// Create moderators, change roles, delete accounts
    ManageUsers,
}

const EVERYONE: &[Role] = &[Role::User, Role::Moderator, Role::Admin];
const STAFF: &[Role] = &[Role::Moderator, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::CreateHelpRequest,
        Operation::ViewOwnRequests,
        Operation::CreateSupportRequest,
        Operation::ListSupportRequests,
        Operation::ReviewSupportRequest,
        Operation::AdvanceLogistics,
        Operation::ViewLogisticsHistory,
        Operation::ViewActivityLogs,
        Operation::ManageUsers,
    ];

    /// The single source of truth for who may do what.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Operation::CreateHelpRequest | Operation::ViewOwnRequests => EVERYONE,
            Operation::CreateSupportRequest => &[Role::User],
            Operation::ListSupportRequests
            | Operation::ReviewSupportRequest
            | Operation::AdvanceLogistics
            | Operation::ViewLogisticsHistory => STAFF,
            Operation::ViewActivityLogs | Operation::ManageUsers => ADMIN_ONLY,
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateHelpRequest => "create_help_request",
            Operation::ViewOwnRequests => "view_own_requests",
            Operation::CreateSupportRequest => "create_support_request",
            Operation::ListSupportRequests => "list_support_requests",
            Operation::ReviewSupportRequest => "review_support_request",
            Operation::AdvanceLogistics => "advance_logistics",
            Operation::ViewLogisticsHistory => "view_logistics_history",
            Operation::ViewActivityLogs => "view_activity_logs",
            Operation::ManageUsers => "manage_users",
        };
        f.write_str(name)
    }
}
