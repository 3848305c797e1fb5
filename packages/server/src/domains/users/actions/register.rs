//! Account creation actions

use serde_json::json;
use tracing::{info, instrument};

use crate::common::reference::allocate_reference;
use crate::common::{Actor, Identity, Operation, ReliefError, ReliefResult, Role};
use crate::domains::activity::audited;
use crate::domains::users::models::{NewUser, User};
use crate::kernel::{ReliefDeps, StoreTransaction};

/// Self-service registration. Always creates a plain user.
#[instrument(skip_all)]
pub async fn register_user(input: NewUser, deps: &ReliefDeps) -> ReliefResult<User> {
    let result = create_account(input, Role::User, deps).await;
    let actor = result.as_ref().ok().map(User::identity);
    audited(deps, actor.as_ref(), "user.register", json!({}), result)
}

/// Create the single admin account. Fails once one exists.
#[instrument(skip_all)]
pub async fn bootstrap_admin(input: NewUser, deps: &ReliefDeps) -> ReliefResult<User> {
    let result = create_account(input, Role::Admin, deps).await;
    let actor = result.as_ref().ok().map(User::identity);
    audited(deps, actor.as_ref(), "user.bootstrap_admin", json!({}), result)
}

/// Admin-only creation of a moderator account.
#[instrument(skip_all, fields(actor = %actor.reference))]
pub async fn create_moderator(
    input: NewUser,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<User> {
    let result = match Actor::new(actor).can(Operation::ManageUsers).check() {
        Ok(()) => create_account(input, Role::Moderator, deps).await,
        Err(e) => Err(e),
    };
    let metadata = match &result {
        Ok(user) => json!({ "target": user.ref_id }),
        Err(_) => json!({}),
    };
    audited(deps, Some(actor), "user.create_moderator", metadata, result)
}

async fn create_account(input: NewUser, role: Role, deps: &ReliefDeps) -> ReliefResult<User> {
    input.validate()?;

    let mut tx = deps.store.begin().await?;
    let user = insert_account(tx.as_mut(), input, role).await?;
    tx.commit().await?;

    info!(reference = %user.ref_id, role = %user.role, "account created");
    Ok(user)
}

async fn insert_account(
    tx: &mut dyn StoreTransaction,
    input: NewUser,
    role: Role,
) -> ReliefResult<User> {
    if role == Role::Admin && tx.admin_exists().await? {
        return Err(ReliefError::AlreadyExists { entity: "admin" });
    }

    let reference = allocate_reference(&mut *tx).await?;
    let user = input.into_user(reference, role);
    tx.insert_user(&user).await?;
    Ok(user)
}
