//! Admin account management

use serde_json::json;
use tracing::{info, instrument};

use crate::common::{
    AccessPolicy, Actor, Identity, Operation, ReferenceId, ReliefError, ReliefResult, Role,
};
use crate::domains::activity::audited;
use crate::domains::users::models::{RoleChange, User};
use crate::kernel::{ReliefDeps, StoreTransaction};

/// Newest first, optionally narrowed to one role.
pub async fn list_users(
    role: Option<Role>,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<Vec<User>> {
    let result = match Actor::new(actor).can(Operation::ManageUsers).check() {
        Ok(()) => deps.store.list_users(role).await,
        Err(e) => Err(e),
    };
    audited(deps, Some(actor), "user.list", json!({ "role": role }), result)
}

/// Switch a non-admin account between user and moderator.
#[instrument(skip_all, fields(actor = %actor.reference, target = %target, new_role = %new_role))]
pub async fn change_role(
    target: &ReferenceId,
    new_role: Role,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<RoleChange> {
    let metadata = json!({ "target": target, "new_role": new_role });
    let result = change(target, new_role, actor, deps).await;
    audited(deps, Some(actor), "user.change_role", metadata, result)
}

async fn change(
    target: &ReferenceId,
    new_role: Role,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<RoleChange> {
    Actor::new(actor).can(Operation::ManageUsers).check()?;
    if new_role == Role::Admin {
        return Err(ReliefError::Validation(
            "role must be user or moderator".into(),
        ));
    }

    let mut tx = deps.store.begin().await?;
    let user = lock_manageable(tx.as_mut(), target, actor).await?;
    tx.update_user_role(user.id, new_role).await?;
    tx.commit().await?;

    info!(previous_role = %user.role, "role changed");
    Ok(RoleChange {
        ref_id: user.ref_id,
        previous_role: user.role,
        new_role,
    })
}

/// Remove a non-admin account. Its reference id stays reserved so history
/// keeps pointing at it.
#[instrument(skip_all, fields(actor = %actor.reference, target = %target))]
pub async fn delete_user(
    target: &ReferenceId,
    actor: &Identity,
    deps: &ReliefDeps,
) -> ReliefResult<()> {
    let metadata = json!({ "target": target });
    let result = delete(target, actor, deps).await;
    audited(deps, Some(actor), "user.delete", metadata, result)
}

async fn delete(target: &ReferenceId, actor: &Identity, deps: &ReliefDeps) -> ReliefResult<()> {
    Actor::new(actor).can(Operation::ManageUsers).check()?;

    let mut tx = deps.store.begin().await?;
    let user = lock_manageable(tx.as_mut(), target, actor).await?;
    tx.delete_user(user.id).await?;
    tx.commit().await?;

    info!("account deleted");
    Ok(())
}

async fn lock_manageable(
    tx: &mut dyn StoreTransaction,
    target: &ReferenceId,
    actor: &Identity,
) -> ReliefResult<User> {
    if &actor.reference == target {
        // Self-protection does not depend on whether the row exists.
        AccessPolicy::ensure_may_manage(actor, target, actor.role)?;
    }
    let user = tx
        .user_by_reference_for_update(target)
        .await?
        .ok_or_else(|| ReliefError::not_found("user", target))?;
    AccessPolicy::ensure_may_manage(actor, &user.ref_id, user.role)?;
    Ok(user)
}
