//! Audit trail recording and the admin activity view

mod common;

use std::sync::Arc;
use std::time::Duration;

use crate::common::*;
use relief_core::common::{Role, SupportRequestId};
use relief_core::domains::activity::{
    list_activity, ActivityFilter, ActivityLogEntry, ActivityOutcome,
};
use relief_core::domains::help_requests::create_help_request;
use relief_core::domains::support_requests::{review_support_request, ReviewAction};
use relief_core::kernel::{BaseActivityLogger, BaseStore, StoreActivityLogger};
use serde_json::json;
use test_context::test_context;

async fn insert(ctx: &TestHarness, entry: ActivityLogEntry) {
    ctx.deps.store.insert_activity(&entry).await.unwrap();
}

#[test_context(TestHarness)]
#[tokio::test]
async fn every_outcome_is_recorded_with_its_actor(ctx: &TestHarness) {
    let owner = seed_identity(&ctx.deps, Role::User).await.unwrap();
    let moderator = seed_identity(&ctx.deps, Role::Moderator).await.unwrap();
    let hr = post_help_request(&ctx.deps, &owner, water_request(3))
        .await
        .unwrap();

    let mut empty = water_request(3);
    empty.items.clear();
    create_help_request(empty, &owner, &ctx.deps)
        .await
        .unwrap_err();

    offer(&ctx.deps, &moderator, hr.help_request.id, &[(hr.items[0].id, 1)])
        .await
        .unwrap_err();

    let entries = ctx.activity.entries();
    let summary: Vec<_> = entries
        .iter()
        .map(|e| (e.action.as_str(), e.outcome))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("help_request.create", ActivityOutcome::Success),
            ("help_request.create", ActivityOutcome::Failure),
            ("support_request.create", ActivityOutcome::Denied),
        ]
    );

    assert_eq!(entries[0].actor_ref_id.as_ref(), Some(&owner.reference));
    assert_eq!(entries[0].actor_role, Some(Role::User));
    assert_eq!(entries[0].metadata["items"], json!(1));
    assert_eq!(entries[1].metadata["error"], json!("validation"));
    assert_eq!(entries[2].actor_role, Some(Role::Moderator));
    assert_eq!(entries[2].metadata["error"], json!("unauthorized"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn failed_review_is_recorded_as_failure(ctx: &TestHarness) {
    let moderator = seed_identity(&ctx.deps, Role::Moderator).await.unwrap();

    review_support_request(
        SupportRequestId::new(),
        ReviewAction::Accept,
        None,
        &moderator,
        &ctx.deps,
    )
    .await
    .unwrap_err();

    let entries = ctx.activity.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "support_request.review");
    assert_eq!(entries[0].outcome, ActivityOutcome::Failure);
    assert_eq!(entries[0].metadata["error"], json!("not_found"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn admin_reads_the_log_newest_first_with_filters(ctx: &TestHarness) {
    let admin = seed_identity(&ctx.deps, Role::Admin).await.unwrap();
    let user = seed_identity(&ctx.deps, Role::User).await.unwrap();

    for action in ["help_request.create", "support_request.create", "help_request.create"] {
        insert(
            ctx,
            ActivityLogEntry::new(action, ActivityOutcome::Success).actor(Some(&user)),
        )
        .await;
    }
    insert(
        ctx,
        ActivityLogEntry::new("user.change_role", ActivityOutcome::Success).actor(Some(&admin)),
    )
    .await;

    let all = list_activity(ActivityFilter::default(), &admin, &ctx.deps)
        .await
        .unwrap();
    let actions: Vec<_> = all.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "user.change_role",
            "help_request.create",
            "support_request.create",
            "help_request.create",
        ]
    );

    let by_action = list_activity(
        ActivityFilter {
            action: Some("help_request.create".to_string()),
            ..ActivityFilter::default()
        },
        &admin,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(by_action.len(), 2);

    let by_actor = list_activity(
        ActivityFilter {
            actor_ref_id: Some(admin.reference.clone()),
            ..ActivityFilter::default()
        },
        &admin,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(by_actor.len(), 1);
    assert_eq!(by_actor[0].action, "user.change_role");

    let capped = list_activity(
        ActivityFilter {
            limit: 0,
            ..ActivityFilter::default()
        },
        &admin,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(capped.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn page_size_is_capped(ctx: &TestHarness) {
    let admin = seed_identity(&ctx.deps, Role::Admin).await.unwrap();
    for _ in 0..120 {
        insert(ctx, ActivityLogEntry::new("user.register", ActivityOutcome::Success)).await;
    }

    let page = list_activity(
        ActivityFilter {
            limit: 500,
            ..ActivityFilter::default()
        },
        &admin,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 100);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn only_admins_read_the_log(ctx: &TestHarness) {
    for role in [Role::User, Role::Moderator] {
        let actor = seed_identity(&ctx.deps, role).await.unwrap();
        let err = list_activity(ActivityFilter::default(), &actor, &ctx.deps)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
    }

    assert_eq!(
        ctx.activity.actions(),
        vec![
            ("activity.list".to_string(), ActivityOutcome::Denied),
            ("activity.list".to_string(), ActivityOutcome::Denied),
        ]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn store_logger_persists_in_the_background(ctx: &TestHarness) {
    let store: Arc<dyn BaseStore> = ctx.deps.store.clone();
    let logger = StoreActivityLogger::new(store.clone());

    logger.record(ActivityLogEntry::new("user.register", ActivityOutcome::Success));

    let mut persisted = Vec::new();
    for _ in 0..50 {
        persisted = store.list_activity(&ActivityFilter::default()).await.unwrap();
        if !persisted.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].action, "user.register");
}
