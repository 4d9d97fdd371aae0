use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::events::TeamEvent;
use super::value_objects::TeamId;
use crate::domain::member::MemberId;
use crate::query::{Entity, FieldType, Value};

/// Team entity
///
/// Owns an index of the identities of its members. The index is only
/// changed through `Member::change_team`, which keeps it in agreement with
/// each member's team reference.
///
/// # Invariants
/// - Name cannot be empty
/// - A member id is in the index iff that member's team is this team
///
/// # Example
/// ```
/// use roster::domain::team::Team;
///
/// let (team, events) = Team::new("teamA").expect("valid team");
///
/// assert_eq!(team.name(), "teamA");
/// assert_eq!(team.member_count(), 0);
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: String,
    members: BTreeSet<MemberId>,
}

impl Team {
    /// Creates a new Team with an empty roster
    ///
    /// # Returns
    /// * `Ok((Team, Vec<TeamEvent>))` - New team and a Created event
    /// * `Err(String)` - If the name is empty
    pub fn new(name: impl Into<String>) -> Result<(Self, Vec<TeamEvent>), String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Team name cannot be empty".to_string());
        }

        let team = Self {
            id: TeamId::new(),
            name,
            members: BTreeSet::new(),
        };

        let events = vec![TeamEvent::Created {
            team_id: team.id,
            name: team.name.clone(),
        }];

        Ok((team, events))
    }

    // ===== Getters =====

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identities of the members on this team
    pub fn members(&self) -> &BTreeSet<MemberId> {
        &self.members
    }

    pub fn contains(&self, member_id: MemberId) -> bool {
        self.members.contains(&member_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn enroll(&mut self, member_id: MemberId) -> bool {
        self.members.insert(member_id)
    }

    pub(crate) fn release(&mut self, member_id: MemberId) -> bool {
        self.members.remove(&member_id)
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// The member index is derived from the member table by the loader.
    /// Only to be used by persistence contexts.
    pub fn from_persistence(
        id: TeamId,
        name: String,
        members: impl IntoIterator<Item = MemberId>,
    ) -> Self {
        Self {
            id,
            name,
            members: members.into_iter().collect(),
        }
    }
}

impl Entity for Team {
    const TABLE: &'static str = "team";

    fn value(&self, column: &str) -> Value {
        match column {
            "team_id" => self.id.into_value(),
            "name" => Value::Text(self.name.clone()),
            _ => Value::Null,
        }
    }
}
