// TestDependencies - in-process implementations for testing
//
// Wires ReliefDeps over the memory store (or any other store), real JWT auth
// with a fixed secret, and an activity logger that keeps what it was given.

use std::sync::{Arc, Mutex};

use super::{BaseActivityLogger, BaseStore, MemoryStore, ReliefDeps};
use crate::domains::activity::models::{ActivityLogEntry, ActivityOutcome};
use crate::domains::auth::{JwtAuthProvider, JwtService};

pub const TEST_JWT_SECRET: &str = "relief-test-secret";

// =============================================================================
// Spy Activity Logger
// =============================================================================

#[derive(Default)]
pub struct SpyActivityLogger {
    entries: Mutex<Vec<ActivityLogEntry>>,
}

impl SpyActivityLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// `(action, outcome)` pairs in recording order.
    pub fn actions(&self) -> Vec<(String, ActivityOutcome)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.action.clone(), e.outcome))
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl BaseActivityLogger for SpyActivityLogger {
    fn record(&self, entry: ActivityLogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub store: Arc<dyn BaseStore>,
    pub jwt: Arc<JwtService>,
    pub activity: Arc<SpyActivityLogger>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn BaseStore>) -> Self {
        Self {
            store,
            jwt: Arc::new(JwtService::new(
                TEST_JWT_SECRET,
                "relief-test".to_string(),
                chrono::Duration::hours(1),
            )),
            activity: Arc::new(SpyActivityLogger::new()),
        }
    }

    /// Convert into ReliefDeps for calling actions
    pub fn into_deps(self) -> ReliefDeps {
        let auth = Arc::new(JwtAuthProvider::new(self.jwt, self.store.clone()));
        ReliefDeps::new(self.store, auth, self.activity)
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
