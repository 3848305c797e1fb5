//! Accounts, roles and bearer-token authentication
//!
//! Each management action is checked as admin (succeeds), as a non-admin
//! (unauthorized) and against the self/admin protection rules.

mod common;

use crate::common::*;
use relief_core::common::{ReferenceId, ReliefError, Role};
use relief_core::domains::users::{
    bootstrap_admin, change_role, create_moderator, delete_user, issue_token, list_users,
    register_user, User,
};
use test_context::test_context;

async fn admin(ctx: &TestHarness) -> User {
    bootstrap_admin(new_user("Admin"), &ctx.deps).await.unwrap()
}

// ============================================================================
// Registration
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn registration_creates_a_plain_user(ctx: &TestHarness) {
    let mut input = new_user("Dana");
    input.email = format!("  {}  ", input.email.to_uppercase());
    input.address = Some("   ".to_string());

    let user = register_user(input.clone(), &ctx.deps).await.unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.email, input.email.trim().to_lowercase());
    assert_eq!(user.address, None);
    assert!(ReferenceId::parse(user.ref_id.as_str()).is_ok());

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("password_hash").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_contact_details_are_refused(ctx: &TestHarness) {
    let first = new_user("Eli");
    register_user(first.clone(), &ctx.deps).await.unwrap();

    let mut same_email = new_user("Eli");
    same_email.email = first.email.clone();
    let err = register_user(same_email, &ctx.deps).await.unwrap_err();
    assert_eq!(err.kind(), "already_exists");

    let mut same_phone = new_user("Eli");
    same_phone.phone_number = first.phone_number.clone();
    let err = register_user(same_phone, &ctx.deps).await.unwrap_err();
    assert_eq!(err.kind(), "already_exists");

    let mut bad_email = new_user("Eli");
    bad_email.email = "not-an-address".to_string();
    let err = register_user(bad_email, &ctx.deps).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn only_one_admin_can_be_bootstrapped(ctx: &TestHarness) {
    let first = admin(ctx).await;
    assert_eq!(first.role, Role::Admin);

    let err = bootstrap_admin(new_user("Second"), &ctx.deps)
        .await
        .unwrap_err();
    assert!(matches!(err, ReliefError::AlreadyExists { entity: "admin" }));
}

// ============================================================================
// Management
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn admin_creates_moderators_and_others_cannot(ctx: &TestHarness) {
    let admin = admin(ctx).await.identity();
    let moderator = create_moderator(new_user("Mo"), &admin, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(moderator.role, Role::Moderator);

    let err = create_moderator(new_user("Nope"), &moderator.identity(), &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn admin_moves_accounts_between_user_and_moderator(ctx: &TestHarness) {
    let admin = admin(ctx).await.identity();
    let user = seed_account(&ctx.deps, Role::User).await.unwrap();

    let change = change_role(&user.ref_id, Role::Moderator, &admin, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(change.previous_role, Role::User);
    assert_eq!(change.new_role, Role::Moderator);

    let moderators = list_users(Some(Role::Moderator), &admin, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(moderators.len(), 1);
    assert_eq!(moderators[0].ref_id, user.ref_id);

    change_role(&user.ref_id, Role::User, &admin, &ctx.deps)
        .await
        .unwrap();
    assert!(list_users(Some(Role::Moderator), &admin, &ctx.deps)
        .await
        .unwrap()
        .is_empty());

    let err = change_role(&user.ref_id, Role::Admin, &admin, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = list_users(None, &user.identity(), &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn nobody_changes_or_deletes_themselves(ctx: &TestHarness) {
    let admin = admin(ctx).await.identity();
    let moderator = seed_identity(&ctx.deps, Role::Moderator).await.unwrap();
    let user = seed_identity(&ctx.deps, Role::User).await.unwrap();

    for actor in [&admin, &moderator, &user] {
        let err = change_role(&actor.reference, Role::User, actor, &ctx.deps)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized", "{} changing own role", actor.role);

        let err = delete_user(&actor.reference, actor, &ctx.deps)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unauthorized", "{} deleting itself", actor.role);
    }

    assert_eq!(list_users(None, &admin, &ctx.deps).await.unwrap().len(), 3);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_accounts_are_not_found(ctx: &TestHarness) {
    let admin = admin(ctx).await.identity();
    let ghost = ReferenceId::generate();

    let err = change_role(&ghost, Role::Moderator, &admin, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let err = delete_user(&ghost, &admin, &ctx.deps).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deleted_accounts_lose_access_but_keep_their_reference(ctx: &TestHarness) {
    let admin = admin(ctx).await.identity();
    let user = seed_account(&ctx.deps, Role::User).await.unwrap();
    let token = bearer(&ctx.jwt, &user).unwrap();
    assert_eq!(ctx.deps.authenticate(&token).await.unwrap(), user.identity());

    delete_user(&user.ref_id, &admin, &ctx.deps).await.unwrap();

    let err = ctx.deps.authenticate(&token).await.unwrap_err();
    assert_eq!(err.kind(), "unauthenticated");

    let mut tx = ctx.deps.store.begin().await.unwrap();
    assert!(!tx.reserve_reference(&user.ref_id).await.unwrap());
}

// ============================================================================
// Tokens
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn issued_tokens_resolve_to_the_current_role(ctx: &TestHarness) {
    let admin = admin(ctx).await.identity();
    let user = register_user(new_user("Fay"), &ctx.deps).await.unwrap();

    let token = issue_token(&user.ref_id, &ctx.jwt, &ctx.deps).await.unwrap();
    let identity = ctx.deps.authenticate(&token).await.unwrap();
    assert_eq!(identity.reference, user.ref_id);
    assert_eq!(identity.role, Role::User);

    change_role(&user.ref_id, Role::Moderator, &admin, &ctx.deps)
        .await
        .unwrap();
    let identity = ctx
        .deps
        .authenticate(&format!("Bearer {}", token))
        .await
        .unwrap();
    assert_eq!(identity.role, Role::Moderator);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn bad_tokens_are_unauthenticated(ctx: &TestHarness) {
    for token in ["", "Bearer", "Bearer not.a.jwt"] {
        let err = ctx.deps.authenticate(token).await.unwrap_err();
        assert!(matches!(err, ReliefError::Unauthenticated(_)), "{:?}", token);
    }

    let err = issue_token(&ReferenceId::generate(), &ctx.jwt, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}
