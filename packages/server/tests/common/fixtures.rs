//! Test fixtures for creating test data.
//!
//! Accounts are written straight through a store transaction so any role can
//! be seeded without going through the admin bootstrap. Everything else goes
//! through the public actions.

use anyhow::Result;
use relief_core::common::reference::allocate_reference;
use relief_core::common::{HelpRequestId, Identity, RequestItemId, ReliefResult, Role};
use relief_core::domains::auth::JwtService;
use relief_core::domains::help_requests::{
    create_help_request, HelpRequestWithItems, NewHelpRequest, NewRequestItem, Priority,
};
use relief_core::domains::support_requests::{
    create_support_request, review_support_request, NewSupportRequest, OfferedItem,
    ReviewAction, SupportRequestWithItems,
};
use relief_core::domains::users::{NewUser, User};
use relief_core::kernel::ReliefDeps;
use uuid::Uuid;

/// Registration input with an email and phone number no other test uses.
pub fn new_user(name: &str) -> NewUser {
    let unique = Uuid::new_v4().simple().to_string();
    NewUser {
        name: name.to_string(),
        email: format!("{}-{}@relief.test", name.to_lowercase(), &unique[..12]),
        phone_number: format!("+1555{}", &unique[..10]),
        address: Some("1 Shelter Way".to_string()),
        password_hash: "$argon2id$test".to_string(),
    }
}

/// Insert an account with the given role.
pub async fn seed_account(deps: &ReliefDeps, role: Role) -> Result<User> {
    let mut tx = deps.store.begin().await?;
    let reference = allocate_reference(tx.as_mut()).await?;
    let user = new_user(&format!("{:?}", role)).into_user(reference, role);
    tx.insert_user(&user).await?;
    tx.commit().await?;
    Ok(user)
}

pub async fn seed_identity(deps: &ReliefDeps, role: Role) -> Result<Identity> {
    Ok(seed_account(deps, role).await?.identity())
}

/// `Authorization` header value for an account.
pub fn bearer(jwt: &JwtService, user: &User) -> Result<String> {
    Ok(format!("Bearer {}", jwt.create_token(&user.ref_id)?))
}

/// One line of water, nothing received yet.
pub fn water_request(qty: i32) -> NewHelpRequest {
    NewHelpRequest {
        title: "Drinking water for shelter".to_string(),
        description: "Municipal supply is down".to_string(),
        address: "4 Harbour St".to_string(),
        priority: Some(Priority::High),
        items: vec![NewRequestItem {
            name: "Water".to_string(),
            qty,
            need_qty: None,
        }],
    }
}

/// Water and blankets.
pub fn supplies_request() -> NewHelpRequest {
    NewHelpRequest {
        title: "Evacuation centre supplies".to_string(),
        description: "Overnight stay for 40 people".to_string(),
        address: "School gym, 9 Hill Rd".to_string(),
        priority: None,
        items: vec![
            NewRequestItem {
                name: "Water".to_string(),
                qty: 10,
                need_qty: None,
            },
            NewRequestItem {
                name: "Blankets".to_string(),
                qty: 5,
                need_qty: None,
            },
        ],
    }
}

pub async fn post_help_request(
    deps: &ReliefDeps,
    owner: &Identity,
    input: NewHelpRequest,
) -> Result<HelpRequestWithItems> {
    Ok(create_help_request(input, owner, deps).await?)
}

/// Offer `(item, quantity)` lines against a help request.
pub async fn offer(
    deps: &ReliefDeps,
    donor: &Identity,
    help_request_id: HelpRequestId,
    lines: &[(RequestItemId, i32)],
) -> ReliefResult<SupportRequestWithItems> {
    let input = NewSupportRequest {
        help_request_id,
        items: lines
            .iter()
            .map(|&(request_item_id, quantity)| OfferedItem {
                request_item_id,
                quantity,
                notes: None,
            })
            .collect(),
        notes: None,
    };
    create_support_request(input, donor, deps).await
}

/// Offer and accept in one go, returning the support request.
pub async fn accepted_offer(
    deps: &ReliefDeps,
    donor: &Identity,
    moderator: &Identity,
    help_request_id: HelpRequestId,
    lines: &[(RequestItemId, i32)],
) -> Result<SupportRequestWithItems> {
    let created = offer(deps, donor, help_request_id, lines).await?;
    review_support_request(
        created.support_request.id,
        ReviewAction::Accept,
        None,
        moderator,
        deps,
    )
    .await?;
    Ok(created)
}
