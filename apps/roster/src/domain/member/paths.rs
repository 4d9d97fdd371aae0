use super::member::Member;
use super::value_objects::MemberId;
use crate::domain::team::TeamId;
use crate::query::{EntityPath, Path};

/// Typed column paths for `Member`
///
/// `team` is nullable: it supports `eq` as well as `is_null` and
/// `is_not_null`. `age` is the only path with ordering comparisons.
#[derive(Debug, Clone, Copy)]
pub struct QMember {
    pub id: Path<Member, MemberId>,
    pub user_name: Path<Member, String>,
    pub age: Path<Member, i32>,
    pub team: Path<Member, Option<TeamId>>,
}

/// Path root used with `select_from(MEMBER)`
pub const MEMBER: QMember = QMember {
    id: Path::new("member_id"),
    user_name: Path::new("user_name"),
    age: Path::new("age"),
    team: Path::new("team_id"),
};

impl EntityPath for QMember {
    type Entity = Member;
}
