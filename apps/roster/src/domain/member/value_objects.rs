use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::query::{FieldType, Value};

/// Identity of a Member
///
/// Opaque to callers; generated when the member is constructed so that a
/// team can index the member before it is persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        MemberId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        MemberId(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FieldType for MemberId {
    fn into_value(self) -> Value {
        Value::Uuid(self.0)
    }
}
