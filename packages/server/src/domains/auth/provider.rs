use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::common::{Identity, ReferenceId, ReliefError, ReliefResult};
use crate::kernel::{BaseAuthProvider, BaseStore};

use super::jwt::JwtService;

/// Bearer-token authentication backed by the user directory.
pub struct JwtAuthProvider {
    jwt: Arc<JwtService>,
    store: Arc<dyn BaseStore>,
}

impl JwtAuthProvider {
    pub fn new(jwt: Arc<JwtService>, store: Arc<dyn BaseStore>) -> Self {
        Self { jwt, store }
    }
}

#[async_trait]
impl BaseAuthProvider for JwtAuthProvider {
    async fn identify(&self, token: &str) -> ReliefResult<Identity> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        let claims = self.jwt.verify_token(token).map_err(|e| {
            debug!(error = %e, "rejected bearer token");
            ReliefError::Unauthenticated("invalid or expired token".into())
        })?;
        let reference = ReferenceId::parse(&claims.sub)
            .map_err(|_| ReliefError::Unauthenticated("malformed token subject".into()))?;

        let user = self
            .store
            .user_by_reference(&reference)
            .await?
            .ok_or_else(|| ReliefError::Unauthenticated("account no longer exists".into()))?;

        Ok(user.identity())
    }
}
