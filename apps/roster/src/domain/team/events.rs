use crate::domain::member::MemberId;

use super::value_objects::TeamId;

/// Domain events that occur within the Team aggregate
///
/// Emitted by team creation and by `Member::change_team`; callers log or
/// forward them.
///
/// # Example
/// ```
/// use roster::domain::member::MemberId;
/// use roster::domain::team::{TeamEvent, TeamId};
///
/// let team_id = TeamId::new();
/// let event = TeamEvent::MemberJoined {
///     team_id,
///     member_id: MemberId::new(),
/// };
/// assert_eq!(event.team_id(), team_id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamEvent {
    /// Fired when a team is created
    Created {
        /// ID of the newly created team
        team_id: TeamId,
        /// The team's name
        name: String,
    },
    /// Fired when a member enters the team's roster
    MemberJoined { team_id: TeamId, member_id: MemberId },
    /// Fired when a member leaves the team's roster
    MemberLeft { team_id: TeamId, member_id: MemberId },
}

impl TeamEvent {
    /// Returns the team_id for this event
    pub fn team_id(&self) -> TeamId {
        match self {
            TeamEvent::Created { team_id, .. } => *team_id,
            TeamEvent::MemberJoined { team_id, .. } => *team_id,
            TeamEvent::MemberLeft { team_id, .. } => *team_id,
        }
    }

    /// Returns the member concerned, if any
    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            TeamEvent::Created { .. } => None,
            TeamEvent::MemberJoined { member_id, .. } | TeamEvent::MemberLeft { member_id, .. } => {
                Some(*member_id)
            }
        }
    }
}
