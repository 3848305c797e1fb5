//! Test harnesses for integration testing.
//!
//! `TestHarness` runs every action against the in-memory store and is what
//! most tests use. `PgHarness` talks to a shared Postgres container that is
//! started once on first use and reused by every test after it.

use anyhow::{Context, Result};
use relief_core::domains::auth::JwtService;
use relief_core::kernel::{MemoryStore, PgStore, ReliefDeps, SpyActivityLogger, TestDependencies};
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

fn init_tracing() {
    // Run tests with: RUST_LOG=relief_core=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// In-memory harness
// =============================================================================

/// Fresh in-memory store per test, real JWT auth and a spying activity logger.
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let admin = seed_account(&ctx.deps, Role::Admin).await.unwrap();
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub deps: ReliefDeps,
    /// Same tables as `deps.store`; used to inject faults.
    pub store: MemoryStore,
    pub jwt: Arc<JwtService>,
    pub activity: Arc<SpyActivityLogger>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {}
}

impl TestHarness {
    pub fn new() -> Self {
        init_tracing();

        let store = MemoryStore::new();
        let test_deps = TestDependencies::with_store(Arc::new(store.clone()));
        let jwt = test_deps.jwt.clone();
        let activity = test_deps.activity.clone();

        Self {
            deps: test_deps.into_deps(),
            store,
            jwt,
            activity,
        }
    }
}

// =============================================================================
// Postgres harness
// =============================================================================

/// Shared test infrastructure that persists across all Postgres tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        PgStore::new(pool).migrate().await?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Dependencies over the shared Postgres database.
///
/// The database is shared between tests, so fixtures must use unique emails
/// and phone numbers and must not rely on being the only admin.
pub struct PgHarness {
    pub db_pool: PgPool,
    pub deps: ReliefDeps,
    pub jwt: Arc<JwtService>,
    pub activity: Arc<SpyActivityLogger>,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create Postgres harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl PgHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        let test_deps = TestDependencies::with_store(Arc::new(PgStore::new(db_pool.clone())));
        let jwt = test_deps.jwt.clone();
        let activity = test_deps.activity.clone();

        Ok(Self {
            db_pool,
            deps: test_deps.into_deps(),
            jwt,
            activity,
        })
    }
}
