// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Matching rules, ledger arithmetic and the logistics table live in the domains
// and drive these traits.
//
// Naming convention: Base* for trait names (e.g., BaseStore, BaseAuthProvider)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::common::{
    HelpRequestId, Identity, ReferenceId, ReliefResult, RequestItemId, Role, SupportRequestId,
    UserId,
};
use crate::domains::activity::models::{ActivityFilter, ActivityLogEntry};
use crate::domains::help_requests::models::{
    HelpRequest, HelpRequestStatus, HelpRequestWithItems, RequestItem,
};
use crate::domains::logistics::models::{
    LogisticStatus, LogisticsHistoryEntry, LogisticsHistoryFilter, LogisticsTrackingEntry,
};
use crate::domains::support_requests::models::{
    SupportRequest, SupportRequestDetails, SupportRequestFilter, SupportRequestItem,
    SupportRequestStatus,
};
use crate::domains::users::models::User;

// =============================================================================
// Auth Provider Trait (Infrastructure - token verification)
// =============================================================================

#[async_trait]
pub trait BaseAuthProvider: Send + Sync {
    /// Resolve a bearer token to the caller's current identity.
    ///
    /// Any failure (bad signature, expiry, unknown account) is `Unauthenticated`.
    async fn identify(&self, token: &str) -> ReliefResult<Identity>;
}

// =============================================================================
// Activity Logger Trait (Infrastructure - audit trail)
// =============================================================================

pub trait BaseActivityLogger: Send + Sync {
    /// Record an audited action. Never fails the caller.
    fn record(&self, entry: ActivityLogEntry);
}

// =============================================================================
// Store Traits (Infrastructure - persistence)
// =============================================================================

/// Read side of the store plus the entry point for transactions.
#[async_trait]
pub trait BaseStore: Send + Sync {
    /// Open a transaction. Dropping it without `commit` discards every write.
    async fn begin(&self) -> ReliefResult<Box<dyn StoreTransaction>>;

    async fn user_by_reference(&self, reference: &ReferenceId) -> ReliefResult<Option<User>>;

    /// Newest first, optionally restricted to one role.
    async fn list_users(&self, role: Option<Role>) -> ReliefResult<Vec<User>>;

    async fn help_request(&self, id: HelpRequestId) -> ReliefResult<Option<HelpRequestWithItems>>;

    /// Newest first; every help request when `owner` is `None`.
    async fn list_help_requests(
        &self,
        owner: Option<&ReferenceId>,
    ) -> ReliefResult<Vec<HelpRequestWithItems>>;

    /// Newest first.
    async fn list_support_requests(
        &self,
        filter: &SupportRequestFilter,
    ) -> ReliefResult<Vec<SupportRequestDetails>>;

    /// Most recent first, ties broken by insertion order (newest first).
    /// Nothing is read until the stream is polled.
    fn logistics_history(
        &self,
        filter: LogisticsHistoryFilter,
    ) -> BoxStream<'_, ReliefResult<LogisticsHistoryEntry>>;

    async fn insert_activity(&self, entry: &ActivityLogEntry) -> ReliefResult<()>;

    /// Newest first, at most `filter.effective_limit()` rows.
    async fn list_activity(&self, filter: &ActivityFilter) -> ReliefResult<Vec<ActivityLogEntry>>;
}

/// One unit of work against the store.
///
/// `*_for_update` reads hold a row lock until commit or drop. Workflows lock
/// support request, then help request, then request items in id order.
#[async_trait]
pub trait StoreTransaction: Send {
    // Users and reference ids

    /// `false` when the id is already taken.
    async fn reserve_reference(&mut self, reference: &ReferenceId) -> ReliefResult<bool>;
    async fn admin_exists(&mut self) -> ReliefResult<bool>;
    async fn insert_user(&mut self, user: &User) -> ReliefResult<()>;
    async fn user_by_reference_for_update(
        &mut self,
        reference: &ReferenceId,
    ) -> ReliefResult<Option<User>>;
    async fn update_user_role(&mut self, id: UserId, role: Role) -> ReliefResult<()>;
    async fn delete_user(&mut self, id: UserId) -> ReliefResult<()>;

    // Help requests and their items

    async fn insert_help_request(&mut self, help_request: &HelpRequest) -> ReliefResult<()>;
    async fn insert_request_item(&mut self, item: &RequestItem) -> ReliefResult<()>;
    async fn help_request_for_update(
        &mut self,
        id: HelpRequestId,
    ) -> ReliefResult<Option<HelpRequest>>;
    async fn set_help_request_status(
        &mut self,
        id: HelpRequestId,
        status: HelpRequestStatus,
    ) -> ReliefResult<()>;
    async fn set_logistic_status(
        &mut self,
        id: HelpRequestId,
        status: LogisticStatus,
    ) -> ReliefResult<()>;
    async fn request_item(&mut self, id: RequestItemId) -> ReliefResult<Option<RequestItem>>;
    async fn request_item_for_update(
        &mut self,
        id: RequestItemId,
    ) -> ReliefResult<Option<RequestItem>>;
    /// Persist `need_qty` and `received_qty` of an already locked item.
    async fn update_item_quantities(&mut self, item: &RequestItem) -> ReliefResult<()>;
    /// Items of the help request whose `need_qty` is still above zero.
    async fn count_remaining_needs(&mut self, help_request_id: HelpRequestId) -> ReliefResult<i64>;

    // Support requests

    async fn insert_support_request(&mut self, support_request: &SupportRequest)
        -> ReliefResult<()>;
    async fn insert_support_request_item(&mut self, item: &SupportRequestItem)
        -> ReliefResult<()>;
    async fn support_request_for_update(
        &mut self,
        id: SupportRequestId,
    ) -> ReliefResult<Option<SupportRequest>>;
    async fn support_request_items(
        &mut self,
        id: SupportRequestId,
    ) -> ReliefResult<Vec<SupportRequestItem>>;
    async fn set_support_request_status(
        &mut self,
        id: SupportRequestId,
        status: SupportRequestStatus,
        updated_at: DateTime<Utc>,
    ) -> ReliefResult<()>;

    // Logistics

    async fn append_tracking_entry(&mut self, entry: &LogisticsTrackingEntry) -> ReliefResult<()>;

    /// Make every write of this transaction visible at once.
    fn commit(self: Box<Self>) -> BoxFuture<'static, ReliefResult<()>>;
}
