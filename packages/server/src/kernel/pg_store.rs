//! Postgres store (sqlx).
//!
//! Review and advance lock rows with `SELECT ... FOR UPDATE` in a fixed order
//! (support request, help request, request items by id), so concurrent
//! moderators serialize on the same help request instead of deadlocking.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::debug;

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

const SINGLE_ADMIN_INDEX: &str = "users_single_admin_idx";

/// Map unique violations onto `AlreadyExists`, everything else through `From`.
fn map_insert_error(err: sqlx::Error, entity: &'static str) -> ReliefError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let entity = if db.constraint() == Some(SINGLE_ADMIN_INDEX) {
                "admin"
            } else {
                entity
            };
            return ReliefError::AlreadyExists { entity };
        }
    }
    err.into()
}

fn ensure_one_row(rows_affected: u64, entity: &'static str, id: impl ToString) -> ReliefResult<()> {
    if rows_affected == 0 {
        return Err(ReliefError::not_found(entity, id));
    }
    Ok(())
}

const HISTORY_SQL: &str = r#"
    SELECT lt.id, lt.support_request_id, lt.previous_status, lt.new_status,
           lt.handler_ref_id, lt.notes, lt.recorded_at,
           hr.title AS help_request_title,
           handler.name AS handler_name,
           handler.role AS handler_role,
           requester.name AS requester_name
    FROM logistics_tracking lt
    JOIN support_requests sr ON sr.id = lt.support_request_id
    JOIN help_requests hr ON hr.id = sr.help_request_id
    LEFT JOIN users handler ON handler.ref_id = lt.handler_ref_id
    LEFT JOIN users requester ON requester.ref_id = sr.user_ref_id
    WHERE ($1::uuid IS NULL OR lt.support_request_id = $1)
      AND ($2::logistic_status IS NULL OR lt.new_status = $2)
      AND ($3::timestamptz IS NULL OR lt.recorded_at >= $3)
      AND ($4::timestamptz IS NULL OR lt.recorded_at <= $4)
    ORDER BY lt.recorded_at DESC, lt.seq DESC
"#;

#[derive(sqlx::FromRow)]
struct SupportRequestRow {
    #[sqlx(flatten)]
    support_request: SupportRequest,
    help_request_title: String,
    requester_name: Option<String>,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")
    }

    async fn attach_items(
        &self,
        help_requests: Vec<HelpRequest>,
    ) -> ReliefResult<Vec<HelpRequestWithItems>> {
        let ids: Vec<HelpRequestId> = help_requests.iter().map(|h| h.id).collect();
        let items = sqlx::query_as::<_, RequestItem>(
            r#"
            SELECT id, help_request_id, position, name, qty, need_qty, received_qty
            FROM request_items
            WHERE help_request_id = ANY($1)
            ORDER BY help_request_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_request: HashMap<HelpRequestId, Vec<RequestItem>> = HashMap::new();
        for item in items {
            by_request.entry(item.help_request_id).or_default().push(item);
        }

        Ok(help_requests
            .into_iter()
            .map(|help_request| HelpRequestWithItems {
                items: by_request.remove(&help_request.id).unwrap_or_default(),
                help_request,
            })
            .collect())
    }
}

#[async_trait]
impl BaseStore for PgStore {
    async fn begin(&self) -> ReliefResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn user_by_reference(&self, reference: &ReferenceId) -> ReliefResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, ref_id, name, email, phone_number, address, password_hash, role, created_at
            FROM users
            WHERE ref_id = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn list_users(&self, role: Option<Role>) -> ReliefResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, ref_id, name, email, phone_number, address, password_hash, role, created_at
            FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn help_request(&self, id: HelpRequestId) -> ReliefResult<Option<HelpRequestWithItems>> {
        let help_request = sqlx::query_as::<_, HelpRequest>(
            r#"
            SELECT id, title, description, address, status, priority, logistic_status,
                   user_ref_id, created_at
            FROM help_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match help_request {
            Some(help_request) => Ok(self.attach_items(vec![help_request]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_help_requests(
        &self,
        owner: Option<&ReferenceId>,
    ) -> ReliefResult<Vec<HelpRequestWithItems>> {
        let help_requests = sqlx::query_as::<_, HelpRequest>(
            r#"
            SELECT id, title, description, address, status, priority, logistic_status,
                   user_ref_id, created_at
            FROM help_requests
            WHERE ($1::text IS NULL OR user_ref_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner.cloned())
        .fetch_all(&self.pool)
        .await?;

        debug!(count = help_requests.len(), "loaded help requests");
        self.attach_items(help_requests).await
    }

    async fn list_support_requests(
        &self,
        filter: &SupportRequestFilter,
    ) -> ReliefResult<Vec<SupportRequestDetails>> {
        let rows = sqlx::query_as::<_, SupportRequestRow>(
            r#"
            SELECT sr.id, sr.help_request_id, sr.user_ref_id, sr.status, sr.notes,
                   sr.created_at, sr.updated_at,
                   hr.title AS help_request_title,
                   u.name AS requester_name
            FROM support_requests sr
            JOIN help_requests hr ON hr.id = sr.help_request_id
            LEFT JOIN users u ON u.ref_id = sr.user_ref_id
            WHERE ($1::support_request_status IS NULL OR sr.status = $1)
              AND ($2::uuid IS NULL OR sr.help_request_id = $2)
              AND ($3::text IS NULL OR sr.user_ref_id = $3)
            ORDER BY sr.created_at DESC, sr.id DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.help_request_id)
        .bind(filter.requester.clone())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<SupportRequestId> = rows.iter().map(|r| r.support_request.id).collect();
        let items = sqlx::query_as::<_, SupportRequestItemDetails>(
            r#"
            SELECT sri.id, sri.support_request_id, sri.request_item_id, sri.quantity_offered,
                   sri.notes, ri.name AS item_name
            FROM support_request_items sri
            JOIN request_items ri ON ri.id = sri.request_item_id
            WHERE sri.support_request_id = ANY($1)
            ORDER BY sri.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_request: HashMap<SupportRequestId, Vec<SupportRequestItemDetails>> =
            HashMap::new();
        for item in items {
            by_request
                .entry(item.item.support_request_id)
                .or_default()
                .push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| SupportRequestDetails {
                items: by_request
                    .remove(&row.support_request.id)
                    .unwrap_or_default(),
                support_request: row.support_request,
                help_request_title: row.help_request_title,
                requester_name: row.requester_name,
            })
            .collect())
    }

    fn logistics_history(
        &self,
        filter: LogisticsHistoryFilter,
    ) -> BoxStream<'_, ReliefResult<LogisticsHistoryEntry>> {
        sqlx::query_as::<_, LogisticsHistoryEntry>(HISTORY_SQL)
            .bind(filter.support_request_id)
            .bind(filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch(&self.pool)
            .map_err(ReliefError::from)
            .boxed()
    }

    async fn insert_activity(&self, entry: &ActivityLogEntry) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, actor_ref_id, actor_role, action, outcome, metadata, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.actor_ref_id)
        .bind(entry.actor_role)
        .bind(&entry.action)
        .bind(entry.outcome)
        .bind(&entry.metadata)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_activity(&self, filter: &ActivityFilter) -> ReliefResult<Vec<ActivityLogEntry>> {
        sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT id, actor_ref_id, actor_role, action, outcome, metadata, recorded_at
            FROM activity_log
            WHERE ($1::timestamptz IS NULL OR recorded_at >= $1)
              AND ($2::timestamptz IS NULL OR recorded_at <= $2)
              AND ($3::text IS NULL OR actor_ref_id = $3)
              AND ($4::text IS NULL OR action = $4)
            ORDER BY recorded_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.actor_ref_id.clone())
        .bind(filter.action.clone())
        .bind(filter.effective_limit())
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}

/// A live database transaction. Dropping it rolls back.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn reserve_reference(&mut self, reference: &ReferenceId) -> ReliefResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_refs (ref_id) VALUES ($1) ON CONFLICT (ref_id) DO NOTHING",
        )
        .bind(reference)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn admin_exists(&mut self) -> ReliefResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'admin')")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(Into::into)
    }

    async fn insert_user(&mut self, user: &User) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, ref_id, name, email, phone_number, address, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.ref_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.address)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "user"))?;
        Ok(())
    }

    async fn user_by_reference_for_update(
        &mut self,
        reference: &ReferenceId,
    ) -> ReliefResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, ref_id, name, email, phone_number, address, password_hash, role, created_at
            FROM users
            WHERE ref_id = $1
            FOR UPDATE
            "#,
        )
        .bind(reference)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn update_user_role(&mut self, id: UserId, role: Role) -> ReliefResult<()> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_insert_error(e, "user"))?;
        ensure_one_row(result.rows_affected(), "user", id)
    }

    async fn delete_user(&mut self, id: UserId) -> ReliefResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        ensure_one_row(result.rows_affected(), "user", id)
    }

    async fn insert_help_request(&mut self, help_request: &HelpRequest) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO help_requests
                (id, title, description, address, status, priority, logistic_status, user_ref_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(help_request.id)
        .bind(&help_request.title)
        .bind(&help_request.description)
        .bind(&help_request.address)
        .bind(help_request.status)
        .bind(help_request.priority)
        .bind(help_request.logistic_status)
        .bind(&help_request.user_ref_id)
        .bind(help_request.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_request_item(&mut self, item: &RequestItem) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO request_items (id, help_request_id, position, name, qty, need_qty, received_qty)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(item.help_request_id)
        .bind(item.position)
        .bind(&item.name)
        .bind(item.qty)
        .bind(item.need_qty)
        .bind(item.received_qty)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn help_request_for_update(
        &mut self,
        id: HelpRequestId,
    ) -> ReliefResult<Option<HelpRequest>> {
        sqlx::query_as::<_, HelpRequest>(
            r#"
            SELECT id, title, description, address, status, priority, logistic_status,
                   user_ref_id, created_at
            FROM help_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn set_help_request_status(
        &mut self,
        id: HelpRequestId,
        status: HelpRequestStatus,
    ) -> ReliefResult<()> {
        let result = sqlx::query("UPDATE help_requests SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;
        ensure_one_row(result.rows_affected(), "help_request", id)
    }

    async fn set_logistic_status(
        &mut self,
        id: HelpRequestId,
        status: LogisticStatus,
    ) -> ReliefResult<()> {
        let result = sqlx::query("UPDATE help_requests SET logistic_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;
        ensure_one_row(result.rows_affected(), "help_request", id)
    }

    async fn request_item(&mut self, id: RequestItemId) -> ReliefResult<Option<RequestItem>> {
        sqlx::query_as::<_, RequestItem>(
            r#"
            SELECT id, help_request_id, position, name, qty, need_qty, received_qty
            FROM request_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn request_item_for_update(
        &mut self,
        id: RequestItemId,
    ) -> ReliefResult<Option<RequestItem>> {
        sqlx::query_as::<_, RequestItem>(
            r#"
            SELECT id, help_request_id, position, name, qty, need_qty, received_qty
            FROM request_items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn update_item_quantities(&mut self, item: &RequestItem) -> ReliefResult<()> {
        let result = sqlx::query(
            "UPDATE request_items SET need_qty = $2, received_qty = $3 WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.need_qty)
        .bind(item.received_qty)
        .execute(&mut *self.tx)
        .await?;
        ensure_one_row(result.rows_affected(), "request_item", item.id)
    }

    async fn count_remaining_needs(&mut self, help_request_id: HelpRequestId) -> ReliefResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM request_items WHERE help_request_id = $1 AND need_qty > 0",
        )
        .bind(help_request_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn insert_support_request(
        &mut self,
        support_request: &SupportRequest,
    ) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO support_requests
                (id, help_request_id, user_ref_id, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(support_request.id)
        .bind(support_request.help_request_id)
        .bind(&support_request.user_ref_id)
        .bind(support_request.status)
        .bind(&support_request.notes)
        .bind(support_request.created_at)
        .bind(support_request.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_support_request_item(
        &mut self,
        item: &SupportRequestItem,
    ) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO support_request_items
                (id, support_request_id, request_item_id, quantity_offered, notes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id)
        .bind(item.support_request_id)
        .bind(item.request_item_id)
        .bind(item.quantity_offered)
        .bind(&item.notes)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn support_request_for_update(
        &mut self,
        id: SupportRequestId,
    ) -> ReliefResult<Option<SupportRequest>> {
        sqlx::query_as::<_, SupportRequest>(
            r#"
            SELECT id, help_request_id, user_ref_id, status, notes, created_at, updated_at
            FROM support_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn support_request_items(
        &mut self,
        id: SupportRequestId,
    ) -> ReliefResult<Vec<SupportRequestItem>> {
        sqlx::query_as::<_, SupportRequestItem>(
            r#"
            SELECT id, support_request_id, request_item_id, quantity_offered, notes
            FROM support_request_items
            WHERE support_request_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(Into::into)
    }

    async fn set_support_request_status(
        &mut self,
        id: SupportRequestId,
        status: SupportRequestStatus,
        updated_at: DateTime<Utc>,
    ) -> ReliefResult<()> {
        let result =
            sqlx::query("UPDATE support_requests SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(status)
                .bind(updated_at)
                .execute(&mut *self.tx)
                .await?;
        ensure_one_row(result.rows_affected(), "support_request", id)
    }

    async fn append_tracking_entry(&mut self, entry: &LogisticsTrackingEntry) -> ReliefResult<()> {
        sqlx::query(
            r#"
            INSERT INTO logistics_tracking
                (id, support_request_id, previous_status, new_status, handler_ref_id, notes, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.support_request_id)
        .bind(entry.previous_status)
        .bind(entry.new_status)
        .bind(&entry.handler_ref_id)
        .bind(&entry.notes)
        .bind(entry.recorded_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, ReliefResult<()>> {
        Box::pin(async move { self.tx.commit().await.map_err(Into::into) })
    }
}
