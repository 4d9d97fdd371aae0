use serde::{Deserialize, Serialize};

use super::value_objects::MemberId;
use crate::domain::team::{Team, TeamEvent, TeamId};
use crate::query::{Entity, FieldType, Value};

/// Member entity
///
/// Holds the identity of its team rather than the team itself. Loading the
/// team is an explicit call on the persistence context.
///
/// # Invariants
/// - `team_id` and the referenced team's member index always agree
/// - The team reference is only changed through [`Member::change_team`]
///
/// # Example
/// ```
/// use roster::domain::member::Member;
/// use roster::domain::team::Team;
///
/// let (mut team_a, _) = Team::new("teamA").unwrap();
/// let (mut team_b, _) = Team::new("teamB").unwrap();
/// let (mut member, _) = Member::with_team("member1", 10, &mut team_a);
///
/// member.change_team(Some(&mut team_a), &mut team_b).unwrap();
///
/// assert_eq!(member.team_id(), Some(team_b.id()));
/// assert!(team_b.contains(member.id()));
/// assert!(!team_a.contains(member.id()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    user_name: String,
    age: i32,
    team_id: Option<TeamId>,
}

impl Member {
    /// Creates a member that belongs to no team
    pub fn new(user_name: impl Into<String>, age: i32) -> Self {
        Self {
            id: MemberId::new(),
            user_name: user_name.into(),
            age,
            team_id: None,
        }
    }

    /// Creates a member with age 0 and no team
    pub fn named(user_name: impl Into<String>) -> Self {
        Self::new(user_name, 0)
    }

    /// Creates a member already enrolled in `team`
    pub fn with_team(user_name: impl Into<String>, age: i32, team: &mut Team) -> (Self, TeamEvent) {
        let mut member = Self::new(user_name, age);
        let event = member.enter(team);
        (member, event)
    }

    /// Moves this member to `next`, keeping both rosters in agreement
    ///
    /// # Arguments
    /// * `current` - The team the member belongs to now, `None` if it has none
    /// * `next` - The team to join
    ///
    /// # Returns
    /// * `Ok(Vec<TeamEvent>)` - `MemberLeft` (if it had a team) then `MemberJoined`;
    ///   empty when `next` is already the member's team
    /// * `Err(String)` - If `current` is not the member's current team;
    ///   nothing is modified in that case
    pub fn change_team(
        &mut self,
        current: Option<&mut Team>,
        next: &mut Team,
    ) -> Result<Vec<TeamEvent>, String> {
        let supplied = current.as_ref().map(|team| team.id());
        if supplied != self.team_id {
            return Err(match self.team_id {
                Some(team_id) => format!(
                    "Member {} belongs to team {}; that team must be supplied",
                    self.id, team_id
                ),
                None => format!(
                    "Member {} has no team, but a current team was supplied",
                    self.id
                ),
            });
        }

        if self.team_id == Some(next.id()) {
            next.enroll(self.id);
            return Ok(Vec::new());
        }

        let mut events = Vec::with_capacity(2);
        if let Some(previous) = current {
            previous.release(self.id);
            events.push(TeamEvent::MemberLeft {
                team_id: previous.id(),
                member_id: self.id,
            });
        }
        events.push(self.enter(next));

        Ok(events)
    }

    fn enter(&mut self, team: &mut Team) -> TeamEvent {
        self.team_id = Some(team.id());
        team.enroll(self.id);
        TeamEvent::MemberJoined {
            team_id: team.id(),
            member_id: self.id,
        }
    }

    // ===== Getters =====

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    /// Identity of the member's team; load it through the persistence context
    pub fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    /// Reconstructs a Member from persistence layer data
    ///
    /// Only to be used by persistence contexts.
    pub fn from_persistence(
        id: MemberId,
        user_name: String,
        age: i32,
        team_id: Option<TeamId>,
    ) -> Self {
        Self {
            id,
            user_name,
            age,
            team_id,
        }
    }
}

impl Entity for Member {
    const TABLE: &'static str = "member";

    fn value(&self, column: &str) -> Value {
        match column {
            "member_id" => self.id.into_value(),
            "user_name" => Value::Text(self.user_name.clone()),
            "age" => self.age.into_value(),
            "team_id" => self.team_id.into_value(),
            _ => Value::Null,
        }
    }
}
