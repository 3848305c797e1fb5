//! Kernel module - infrastructure seams and their implementations.

pub mod activity_loggers;
pub mod deps;
pub mod memory_store;
pub mod pg_store;
pub mod test_dependencies;
pub mod traits;

pub use activity_loggers::{StoreActivityLogger, TracingActivityLogger};
pub use deps::ReliefDeps;
pub use memory_store::{MemoryStore, StoreFault};
pub use pg_store::{PgStore, PgTransaction};
pub use test_dependencies::{SpyActivityLogger, TestDependencies};
pub use traits::*;
