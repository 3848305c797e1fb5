//! Relief dependencies for actions (using traits for testability)
//!
//! Every domain action takes `&ReliefDeps`; nothing reaches for a global pool.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::common::{Identity, ReliefResult};
use crate::config::Config;
use crate::domains::auth::{JwtAuthProvider, JwtService};
use crate::kernel::{
    BaseActivityLogger, BaseAuthProvider, BaseStore, PgStore, StoreActivityLogger,
};

#[derive(Clone)]
pub struct ReliefDeps {
    pub store: Arc<dyn BaseStore>,
    pub auth: Arc<dyn BaseAuthProvider>,
    pub activity: Arc<dyn BaseActivityLogger>,
}

impl ReliefDeps {
    pub fn new(
        store: Arc<dyn BaseStore>,
        auth: Arc<dyn BaseAuthProvider>,
        activity: Arc<dyn BaseActivityLogger>,
    ) -> Self {
        Self {
            store,
            auth,
            activity,
        }
    }

    /// Postgres-backed dependencies with JWT auth and a store-backed activity log.
    pub async fn connect(config: &Config) -> Result<(Self, Arc<JwtService>)> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        let store: Arc<dyn BaseStore> = Arc::new(PgStore::new(pool));
        let jwt = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.jwt_ttl,
        ));
        let auth = Arc::new(JwtAuthProvider::new(jwt.clone(), store.clone()));
        let activity = Arc::new(StoreActivityLogger::new(store.clone()));

        Ok((Self::new(store, auth, activity), jwt))
    }

    pub async fn authenticate(&self, token: &str) -> ReliefResult<Identity> {
        self.auth.identify(token).await
    }
}
