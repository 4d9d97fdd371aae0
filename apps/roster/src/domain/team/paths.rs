use super::team::Team;
use super::value_objects::TeamId;
use crate::query::{EntityPath, Path};

/// Typed column paths for `Team`
#[derive(Debug, Clone, Copy)]
pub struct QTeam {
    pub id: Path<Team, TeamId>,
    pub name: Path<Team, String>,
}

/// Path root used with `select_from(TEAM)`
pub const TEAM: QTeam = QTeam {
    id: Path::new("team_id"),
    name: Path::new("name"),
};

impl EntityPath for QTeam {
    type Entity = Team;
}
