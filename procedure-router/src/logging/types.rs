//! Request correlation identifiers.

use serde::{Deserialize, Serialize};

/// Number of characters kept by [`RequestId::short`].
pub const SHORT_ID_LENGTH: usize = 8;

/// Unique identifier for an invocation, used to correlate its log events.
///
/// Uses UUID v7 so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    /// Returns the first [`SHORT_ID_LENGTH`] characters of the ID.
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(SHORT_ID_LENGTH).collect()
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for RequestId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
