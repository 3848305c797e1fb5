use serde_json::Value;

use crate::common::{Identity, ReliefResult};
use crate::domains::activity::models::{ActivityLogEntry, ActivityOutcome};
use crate::kernel::ReliefDeps;

/// Record how an action ended, then hand the result back unchanged.
///
/// Failures carry their `kind()` under `"error"` in the metadata.
pub fn audited<T>(
    deps: &ReliefDeps,
    actor: Option<&Identity>,
    action: &str,
    metadata: Value,
    result: ReliefResult<T>,
) -> ReliefResult<T> {
    let entry = match &result {
        Ok(_) => ActivityLogEntry::new(action, ActivityOutcome::Success).metadata(metadata),
        Err(err) => {
            let mut metadata = metadata;
            if let Value::Object(map) = &mut metadata {
                map.insert("error".into(), Value::String(err.kind().into()));
            }
            ActivityLogEntry::from_error(action, err).metadata(metadata)
        }
    };
    deps.activity.record(entry.actor(actor));
    result
}
