use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::query::{FieldType, Value};

/// Identity of a Team
///
/// # Invariants
/// - Generated once when the team is created
/// - Never reassigned
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TeamId(Uuid);

impl TeamId {
    /// Generates a fresh random identity
    pub fn new() -> Self {
        TeamId(Uuid::new_v4())
    }

    /// Wraps an identity read back from storage
    pub fn from_uuid(id: Uuid) -> Self {
        TeamId(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TeamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FieldType for TeamId {
    fn into_value(self) -> Value {
        Value::Uuid(self.0)
    }
}
