//! Help request creation and listing

mod common;

use crate::common::*;
use relief_core::common::{HelpRequestId, ReliefError, Role};
use relief_core::domains::activity::ActivityOutcome;
use relief_core::domains::help_requests::{
    get_help_request, list_own_help_requests, list_public_help_requests, HelpRequestStatus,
    NewRequestItem, Priority,
};
use relief_core::domains::logistics::LogisticStatus;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn every_role_can_post_a_help_request(ctx: &TestHarness) {
    for role in Role::ALL {
        let owner = seed_identity(&ctx.deps, role).await.unwrap();
        let created = post_help_request(&ctx.deps, &owner, water_request(10))
            .await
            .unwrap();

        assert_eq!(created.help_request.user_ref_id, owner.reference);
        assert_eq!(created.help_request.status, HelpRequestStatus::Active);
        assert_eq!(created.help_request.logistic_status, LogisticStatus::Pending);
        assert_eq!(created.help_request.priority, Priority::High);
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn items_keep_their_order_and_default_need(ctx: &TestHarness) {
    let owner = seed_identity(&ctx.deps, Role::User).await.unwrap();
    let mut input = supplies_request();
    input.items.push(NewRequestItem {
        name: "  Torches ".to_string(),
        qty: 8,
        need_qty: Some(3),
    });

    let created = post_help_request(&ctx.deps, &owner, input).await.unwrap();
    let stored = get_help_request(created.help_request.id, &ctx.deps)
        .await
        .unwrap();

    assert_eq!(stored.help_request.priority, Priority::Medium);
    let lines: Vec<_> = stored
        .items
        .iter()
        .map(|i| (i.position, i.name.as_str(), i.qty, i.need_qty, i.received_qty))
        .collect();
    assert_eq!(
        lines,
        vec![
            (0, "Water", 10, 10, 0),
            (1, "Blankets", 5, 5, 0),
            (2, "Torches", 8, 3, 0),
        ]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_fields_fail_without_writing(ctx: &TestHarness) {
    let owner = seed_identity(&ctx.deps, Role::User).await.unwrap();

    let mut no_address = water_request(10);
    no_address.address = "  ".to_string();
    let err = post_help_request(&ctx.deps, &owner, no_address)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReliefError>(),
        Some(ReliefError::Validation(_))
    ));

    let mut no_items = water_request(10);
    no_items.items.clear();
    assert!(post_help_request(&ctx.deps, &owner, no_items).await.is_err());

    assert!(list_public_help_requests(&ctx.deps).await.unwrap().is_empty());
    assert_eq!(
        ctx.activity.actions(),
        vec![
            ("help_request.create".to_string(), ActivityOutcome::Failure),
            ("help_request.create".to_string(), ActivityOutcome::Failure),
        ]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn public_board_shows_quantities_newest_first(ctx: &TestHarness) {
    let owner = seed_identity(&ctx.deps, Role::User).await.unwrap();
    let first = post_help_request(&ctx.deps, &owner, water_request(4))
        .await
        .unwrap();
    let second = post_help_request(&ctx.deps, &owner, supplies_request())
        .await
        .unwrap();

    let board = list_public_help_requests(&ctx.deps).await.unwrap();
    let ids: Vec<_> = board.iter().map(|r| r.help_request.id).collect();
    assert_eq!(ids, vec![second.help_request.id, first.help_request.id]);
    assert_eq!(board[0].items.len(), 2);
    assert_eq!(board[1].items[0].need_qty, 4);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn own_listing_only_returns_the_callers_requests(ctx: &TestHarness) {
    let alice = seed_identity(&ctx.deps, Role::User).await.unwrap();
    let bob = seed_identity(&ctx.deps, Role::User).await.unwrap();
    let mine = post_help_request(&ctx.deps, &alice, water_request(2))
        .await
        .unwrap();
    post_help_request(&ctx.deps, &bob, water_request(3))
        .await
        .unwrap();

    let own = list_own_help_requests(&alice, &ctx.deps).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].help_request.id, mine.help_request.id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_help_request_is_not_found(ctx: &TestHarness) {
    let err = get_help_request(HelpRequestId::new(), &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}
