//! In-process store.
//!
//! Transactions are serialized behind one async mutex and write to a private
//! copy of the tables that replaces the shared state on commit, so dropping a
//! transaction is a rollback. Used by tests and by embedders that do not need
//! durability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::common::{
    HelpRequestId, ReferenceId, ReliefError, ReliefResult, RequestItemId, Role, SupportRequestId,
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
    SupportRequestItemDetails, SupportRequestStatus,
};
use crate::domains::users::models::User;
use crate::kernel::{BaseStore, StoreTransaction};

/// Writes that can be made to fail once, for exercising rollback paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreFault {
    InsertSupportRequestItem,
    UpdateItemQuantities,
    AppendTrackingEntry,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    references: HashSet<ReferenceId>,
    users: Vec<User>,
    help_requests: Vec<HelpRequest>,
    request_items: Vec<RequestItem>,
    support_requests: Vec<SupportRequest>,
    support_request_items: Vec<SupportRequestItem>,
    // Append order doubles as the insertion sequence for history ordering.
    tracking: Vec<LogisticsTrackingEntry>,
}

impl Tables {
    fn user(&self, reference: &ReferenceId) -> Option<&User> {
        self.users.iter().find(|u| &u.ref_id == reference)
    }

    fn items_of(&self, help_request_id: HelpRequestId) -> Vec<RequestItem> {
        let mut items: Vec<RequestItem> = self
            .request_items
            .iter()
            .filter(|i| i.help_request_id == help_request_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.position);
        items
    }

    fn with_items(&self, help_request: &HelpRequest) -> HelpRequestWithItems {
        HelpRequestWithItems {
            help_request: help_request.clone(),
            items: self.items_of(help_request.id),
        }
    }

    fn support_request_details(&self, support_request: &SupportRequest) -> SupportRequestDetails {
        let items = self
            .support_request_items
            .iter()
            .filter(|i| i.support_request_id == support_request.id)
            .map(|i| SupportRequestItemDetails {
                item: i.clone(),
                item_name: self
                    .request_items
                    .iter()
                    .find(|r| r.id == i.request_item_id)
                    .map(|r| r.name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        SupportRequestDetails {
            support_request: support_request.clone(),
            help_request_title: self
                .help_requests
                .iter()
                .find(|h| h.id == support_request.help_request_id)
                .map(|h| h.title.clone())
                .unwrap_or_default(),
            requester_name: self.user(&support_request.user_ref_id).map(|u| u.name.clone()),
            items,
        }
    }

    fn history(&self, filter: &LogisticsHistoryFilter) -> Vec<LogisticsHistoryEntry> {
        let mut rows: Vec<(usize, LogisticsHistoryEntry)> = self
            .tracking
            .iter()
            .enumerate()
            .filter(|(_, entry)| filter.matches(entry))
            .filter_map(|(seq, entry)| {
                let support_request = self
                    .support_requests
                    .iter()
                    .find(|s| s.id == entry.support_request_id)?;
                let help_request = self
                    .help_requests
                    .iter()
                    .find(|h| h.id == support_request.help_request_id)?;
                let handler = self.user(&entry.handler_ref_id);

                Some((
                    seq,
                    LogisticsHistoryEntry {
                        entry: entry.clone(),
                        help_request_title: help_request.title.clone(),
                        handler_name: handler.map(|u| u.name.clone()),
                        handler_role: handler.map(|u| u.role),
                        requester_name: self
                            .user(&support_request.user_ref_id)
                            .map(|u| u.name.clone()),
                    },
                ))
            })
            .collect();

        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.entry
                .recorded_at
                .cmp(&a.entry.recorded_at)
                .then(b_seq.cmp(a_seq))
        });
        rows.into_iter().map(|(_, row)| row).collect()
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, uuid::Uuid)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn lock<T>(mutex: &StdMutex<T>) -> StdMutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    activity: Arc<StdMutex<Vec<ActivityLogEntry>>>,
    faults: Arc<StdMutex<HashSet<StoreFault>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write of this kind fail inside its transaction.
    pub fn fail_next(&self, fault: StoreFault) {
        lock(&self.faults).insert(fault);
    }
}

#[async_trait]
impl BaseStore for MemoryStore {
    async fn begin(&self) -> ReliefResult<Box<dyn StoreTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = Tables::clone(&guard);
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn user_by_reference(&self, reference: &ReferenceId) -> ReliefResult<Option<User>> {
        Ok(self.tables.lock().await.user(reference).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> ReliefResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, u.id.into_uuid()));
        Ok(users)
    }

    async fn help_request(&self, id: HelpRequestId) -> ReliefResult<Option<HelpRequestWithItems>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .help_requests
            .iter()
            .find(|h| h.id == id)
            .map(|h| tables.with_items(h)))
    }

    async fn list_help_requests(
        &self,
        owner: Option<&ReferenceId>,
    ) -> ReliefResult<Vec<HelpRequestWithItems>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<HelpRequest> = tables
            .help_requests
            .iter()
            .filter(|h| owner.map_or(true, |o| &h.user_ref_id == o))
            .cloned()
            .collect();
        newest_first(&mut requests, |h| (h.created_at, h.id.into_uuid()));
        Ok(requests.iter().map(|h| tables.with_items(h)).collect())
    }

    async fn list_support_requests(
        &self,
        filter: &SupportRequestFilter,
    ) -> ReliefResult<Vec<SupportRequestDetails>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<SupportRequest> = tables
            .support_requests
            .iter()
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .filter(|s| filter.help_request_id.map_or(true, |id| s.help_request_id == id))
            .filter(|s| {
                filter
                    .requester
                    .as_ref()
                    .map_or(true, |r| &s.user_ref_id == r)
            })
            .cloned()
            .collect();
        newest_first(&mut requests, |s| (s.created_at, s.id.into_uuid()));
        Ok(requests
            .iter()
            .map(|s| tables.support_request_details(s))
            .collect())
    }

    fn logistics_history(
        &self,
        filter: LogisticsHistoryFilter,
    ) -> BoxStream<'_, ReliefResult<LogisticsHistoryEntry>> {
        let tables = self.tables.clone();
        stream::once(async move {
            let rows = tables.lock().await.history(&filter);
            stream::iter(rows.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    async fn insert_activity(&self, entry: &ActivityLogEntry) -> ReliefResult<()> {
        lock(&self.activity).push(entry.clone());
        Ok(())
    }

    async fn list_activity(&self, filter: &ActivityFilter) -> ReliefResult<Vec<ActivityLogEntry>> {
        let mut entries: Vec<ActivityLogEntry> = lock(&self.activity)
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        newest_first(&mut entries, |e| (e.recorded_at, e.id.into_uuid()));
        entries.truncate(filter.effective_limit() as usize);
        Ok(entries)
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    faults: Arc<StdMutex<HashSet<StoreFault>>>,
}

impl MemoryTransaction {
    fn trip(&self, fault: StoreFault) -> ReliefResult<()> {
        if lock(&self.faults).remove(&fault) {
            return Err(ReliefError::Internal(anyhow::anyhow!(
                "injected store fault: {:?}",
                fault
            )));
        }
        Ok(())
    }

    fn help_request_mut(&mut self, id: HelpRequestId) -> ReliefResult<&mut HelpRequest> {
        self.working
            .help_requests
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| ReliefError::not_found("help_request", id))
    }

    fn user_mut(&mut self, id: UserId) -> ReliefResult<&mut User> {
        self.working
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ReliefError::not_found("user", id))
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn reserve_reference(&mut self, reference: &ReferenceId) -> ReliefResult<bool> {
        Ok(self.working.references.insert(reference.clone()))
    }

    async fn admin_exists(&mut self) -> ReliefResult<bool> {
        Ok(self.working.users.iter().any(|u| u.role == Role::Admin))
    }

    async fn insert_user(&mut self, user: &User) -> ReliefResult<()> {
        let tables = &mut self.working;
        if !tables.references.contains(&user.ref_id) {
            return Err(ReliefError::Internal(anyhow::anyhow!(
                "reference id {} was never reserved",
                user.ref_id
            )));
        }
        if tables.users.iter().any(|u| {
            u.ref_id == user.ref_id || u.email == user.email || u.phone_number == user.phone_number
        }) {
            return Err(ReliefError::AlreadyExists { entity: "user" });
        }
        if user.role == Role::Admin && tables.users.iter().any(|u| u.role == Role::Admin) {
            return Err(ReliefError::AlreadyExists { entity: "admin" });
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn user_by_reference_for_update(
        &mut self,
        reference: &ReferenceId,
    ) -> ReliefResult<Option<User>> {
        Ok(self.working.user(reference).cloned())
    }

    async fn update_user_role(&mut self, id: UserId, role: Role) -> ReliefResult<()> {
        if role == Role::Admin
            && self
                .working
                .users
                .iter()
                .any(|u| u.role == Role::Admin && u.id != id)
        {
            return Err(ReliefError::AlreadyExists { entity: "admin" });
        }
        self.user_mut(id)?.role = role;
        Ok(())
    }

    async fn delete_user(&mut self, id: UserId) -> ReliefResult<()> {
        let before = self.working.users.len();
        self.working.users.retain(|u| u.id != id);
        if self.working.users.len() == before {
            return Err(ReliefError::not_found("user", id));
        }
        Ok(())
    }

    async fn insert_help_request(&mut self, help_request: &HelpRequest) -> ReliefResult<()> {
        self.working.help_requests.push(help_request.clone());
        Ok(())
    }

    async fn insert_request_item(&mut self, item: &RequestItem) -> ReliefResult<()> {
        if item.need_qty < 0 || item.received_qty < 0 || item.qty <= 0 {
            return Err(ReliefError::Validation(format!(
                "request item {} violates quantity bounds",
                item.id
            )));
        }
        self.working.request_items.push(item.clone());
        Ok(())
    }

    async fn help_request_for_update(
        &mut self,
        id: HelpRequestId,
    ) -> ReliefResult<Option<HelpRequest>> {
        Ok(self
            .working
            .help_requests
            .iter()
            .find(|h| h.id == id)
            .cloned())
    }

    async fn set_help_request_status(
        &mut self,
        id: HelpRequestId,
        status: HelpRequestStatus,
    ) -> ReliefResult<()> {
        self.help_request_mut(id)?.status = status;
        Ok(())
    }

    async fn set_logistic_status(
        &mut self,
        id: HelpRequestId,
        status: LogisticStatus,
    ) -> ReliefResult<()> {
        self.help_request_mut(id)?.logistic_status = status;
        Ok(())
    }

    async fn request_item(&mut self, id: RequestItemId) -> ReliefResult<Option<RequestItem>> {
        Ok(self
            .working
            .request_items
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn request_item_for_update(
        &mut self,
        id: RequestItemId,
    ) -> ReliefResult<Option<RequestItem>> {
        self.request_item(id).await
    }

    async fn update_item_quantities(&mut self, item: &RequestItem) -> ReliefResult<()> {
        self.trip(StoreFault::UpdateItemQuantities)?;
        let row = self
            .working
            .request_items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| ReliefError::not_found("request_item", item.id))?;
        row.need_qty = item.need_qty;
        row.received_qty = item.received_qty;
        Ok(())
    }

    async fn count_remaining_needs(&mut self, help_request_id: HelpRequestId) -> ReliefResult<i64> {
        Ok(self
            .working
            .request_items
            .iter()
            .filter(|i| i.help_request_id == help_request_id && i.has_outstanding_need())
            .count() as i64)
    }

    async fn insert_support_request(
        &mut self,
        support_request: &SupportRequest,
    ) -> ReliefResult<()> {
        self.working.support_requests.push(support_request.clone());
        Ok(())
    }

    async fn insert_support_request_item(
        &mut self,
        item: &SupportRequestItem,
    ) -> ReliefResult<()> {
        self.trip(StoreFault::InsertSupportRequestItem)?;
        self.working.support_request_items.push(item.clone());
        Ok(())
    }

    async fn support_request_for_update(
        &mut self,
        id: SupportRequestId,
    ) -> ReliefResult<Option<SupportRequest>> {
        Ok(self
            .working
            .support_requests
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn support_request_items(
        &mut self,
        id: SupportRequestId,
    ) -> ReliefResult<Vec<SupportRequestItem>> {
        Ok(self
            .working
            .support_request_items
            .iter()
            .filter(|i| i.support_request_id == id)
            .cloned()
            .collect())
    }

    async fn set_support_request_status(
        &mut self,
        id: SupportRequestId,
        status: SupportRequestStatus,
        updated_at: DateTime<Utc>,
    ) -> ReliefResult<()> {
        let row = self
            .working
            .support_requests
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ReliefError::not_found("support_request", id))?;
        row.status = status;
        row.updated_at = updated_at;
        Ok(())
    }

    async fn append_tracking_entry(&mut self, entry: &LogisticsTrackingEntry) -> ReliefResult<()> {
        self.trip(StoreFault::AppendTrackingEntry)?;
        self.working.tracking.push(entry.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, ReliefResult<()>> {
        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Box::pin(future::ready(Ok(())))
    }
}
