//! Opaque public reference ids.
//!
//! Every person in the system is addressed by a `ReferenceId`: 4 random bytes
//! rendered as 8 lowercase hex characters. Help requests, support requests and
//! tracking entries point at their owners and handlers through it, and the JWT
//! subject carries it. Row ids never leave the store as identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::common::errors::{ReliefError, ReliefResult};
use crate::kernel::StoreTransaction;

pub const REFERENCE_ID_BYTES: usize = 4;

/// Collisions in a 32-bit space are rare; exhausting this many in a row means
/// the table is close to full, which callers see as `Conflict`.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Random candidate. Not yet reserved, see [`allocate_reference`].
    pub fn generate() -> Self {
        let bytes: [u8; REFERENCE_ID_BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn parse(value: &str) -> ReliefResult<Self> {
        let well_formed = value.len() == REFERENCE_ID_BYTES * 2
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(ReliefError::Validation(format!(
                "reference id must be {} lowercase hex characters, got {:?}",
                REFERENCE_ID_BYTES * 2,
                value
            )));
        }
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReferenceId {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = ReliefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceId> for String {
    fn from(value: ReferenceId) -> Self {
        value.0
    }
}

/// Reserve a fresh reference id inside `tx`, regenerating on collision.
pub async fn allocate_reference(tx: &mut dyn StoreTransaction) -> ReliefResult<ReferenceId> {
    allocate_reference_with(tx, ReferenceId::generate).await
}

/// Same as [`allocate_reference`] with a caller-supplied candidate source.
pub async fn allocate_reference_with<F>(
    tx: &mut dyn StoreTransaction,
    mut candidate: F,
) -> ReliefResult<ReferenceId>
where
    F: FnMut() -> ReferenceId + Send,
{
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let reference = candidate();
        if tx.reserve_reference(&reference).await? {
            return Ok(reference);
        }
        debug!(attempt, reference = %reference, "reference id already taken, regenerating");
    }

    Err(ReliefError::Conflict(format!(
        "no free reference id after {} attempts",
        MAX_ALLOCATION_ATTEMPTS
    )))
}
