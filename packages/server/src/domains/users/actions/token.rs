use serde_json::json;
use tracing::info;

use crate::common::{ReferenceId, ReliefError, ReliefResult};
use crate::domains::activity::audited;
use crate::domains::auth::JwtService;
use crate::domains::users::models::User;
use crate::kernel::ReliefDeps;

/// Sign a bearer token for an existing account.
///
/// Credential checking happens before this is called; here we only make sure
/// the account exists.
pub async fn issue_token(
    reference: &ReferenceId,
    jwt: &JwtService,
    deps: &ReliefDeps,
) -> ReliefResult<String> {
    let result = sign(reference, jwt, deps).await;
    let actor = match &result {
        Ok((_, user)) => Some(user.identity()),
        Err(_) => None,
    };
    audited(
        deps,
        actor.as_ref(),
        "user.issue_token",
        json!({ "reference": reference }),
        result.map(|(token, _)| token),
    )
}

async fn sign(
    reference: &ReferenceId,
    jwt: &JwtService,
    deps: &ReliefDeps,
) -> ReliefResult<(String, User)> {
    let user = deps
        .store
        .user_by_reference(reference)
        .await?
        .ok_or_else(|| ReliefError::not_found("user", reference))?;
    let token = jwt.create_token(&user.ref_id)?;
    info!(reference = %user.ref_id, "token issued");
    Ok((token, user))
}
