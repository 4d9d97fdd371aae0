use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::member::{Member, MemberId};
use crate::domain::persistence::{
    PersistenceContext, PersistenceError, PersistenceResult, QueryExecutor,
};
use crate::domain::team::{Team, TeamId};
use crate::query::{Entity, Query};

#[derive(Debug, Clone)]
struct TeamRow {
    id: TeamId,
    name: String,
}

/// Rows in insertion order, mirroring the two relational tables
#[derive(Debug, Clone, Default)]
struct Tables {
    teams: Vec<TeamRow>,
    members: Vec<Member>,
}

impl Tables {
    fn upsert_team(&mut self, team: &Team) {
        let row = TeamRow {
            id: team.id(),
            name: team.name().to_string(),
        };
        match self.teams.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => self.teams.push(row),
        }
    }

    fn upsert_member(&mut self, member: &Member) -> PersistenceResult<()> {
        if let Some(team_id) = member.team_id() {
            if !self.teams.iter().any(|r| r.id == team_id) {
                return Err(PersistenceError::MissingReference {
                    table: Team::TABLE,
                    id: team_id.to_string(),
                });
            }
        }

        match self.members.iter_mut().find(|m| m.id() == member.id()) {
            Some(existing) => *existing = member.clone(),
            None => self.members.push(member.clone()),
        }
        Ok(())
    }

    /// Materialises a team with its member index derived from the member rows
    fn team(&self, row: &TeamRow) -> Team {
        let members = self
            .members
            .iter()
            .filter(|m| m.team_id() == Some(row.id))
            .map(Member::id);
        Team::from_persistence(row.id, row.name.clone(), members)
    }

    fn teams(&self) -> Vec<Team> {
        self.teams.iter().map(|row| self.team(row)).collect()
    }
}

#[derive(Debug, Default)]
struct State {
    committed: Tables,
    session: Option<Tables>,
}

impl State {
    fn visible(&self) -> &Tables {
        self.session.as_ref().unwrap_or(&self.committed)
    }

    fn session_mut(&mut self) -> PersistenceResult<&mut Tables> {
        self.session.as_mut().ok_or(PersistenceError::NoActiveSession)
    }
}

/// In-process persistence context
///
/// A session works on a private copy of the tables that replaces the
/// committed state on `commit` and is dropped on `rollback`.
#[derive(Debug, Default)]
pub struct InMemoryContext {
    state: Mutex<State>,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceContext for InMemoryContext {
    async fn begin(&self) -> PersistenceResult<()> {
        let mut state = self.state.lock().await;
        if state.session.is_some() {
            return Err(PersistenceError::SessionAlreadyActive);
        }
        state.session = Some(state.committed.clone());
        tracing::debug!("In-memory session started");
        Ok(())
    }

    async fn commit(&self) -> PersistenceResult<()> {
        let mut state = self.state.lock().await;
        let tables = state
            .session
            .take()
            .ok_or(PersistenceError::NoActiveSession)?;
        tracing::info!(
            teams = tables.teams.len(),
            members = tables.members.len(),
            "In-memory session committed"
        );
        state.committed = tables;
        Ok(())
    }

    async fn rollback(&self) -> PersistenceResult<()> {
        let mut state = self.state.lock().await;
        state
            .session
            .take()
            .ok_or(PersistenceError::NoActiveSession)?;
        tracing::warn!("In-memory session rolled back");
        Ok(())
    }

    async fn persist_team(&self, team: &Team) -> PersistenceResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut()?.upsert_team(team);
        tracing::debug!(team_id = %team.id(), name = team.name(), "Persisted team");
        Ok(())
    }

    async fn persist_member(&self, member: &Member) -> PersistenceResult<()> {
        let mut state = self.state.lock().await;
        state.session_mut()?.upsert_member(member)?;
        tracing::debug!(
            member_id = %member.id(),
            user_name = member.user_name(),
            "Persisted member"
        );
        Ok(())
    }

    async fn find_team(&self, id: TeamId) -> PersistenceResult<Option<Team>> {
        let state = self.state.lock().await;
        let tables = state.visible();
        Ok(tables
            .teams
            .iter()
            .find(|row| row.id == id)
            .map(|row| tables.team(row)))
    }

    async fn find_member(&self, id: MemberId) -> PersistenceResult<Option<Member>> {
        let state = self.state.lock().await;
        Ok(state
            .visible()
            .members
            .iter()
            .find(|m| m.id() == id)
            .cloned())
    }
}

#[async_trait]
impl QueryExecutor<Member> for InMemoryContext {
    async fn fetch(&self, query: &Query<Member>) -> PersistenceResult<Vec<Member>> {
        tracing::debug!(table = query.table(), filter = ?query.predicate(), "Executing query");
        let state = self.state.lock().await;
        Ok(query.apply(&state.visible().members))
    }

    async fn count(&self, query: &Query<Member>) -> PersistenceResult<u64> {
        let state = self.state.lock().await;
        Ok(query.count(&state.visible().members))
    }
}

#[async_trait]
impl QueryExecutor<Team> for InMemoryContext {
    async fn fetch(&self, query: &Query<Team>) -> PersistenceResult<Vec<Team>> {
        tracing::debug!(table = query.table(), filter = ?query.predicate(), "Executing query");
        let state = self.state.lock().await;
        Ok(query.apply(&state.visible().teams()))
    }

    async fn count(&self, query: &Query<Team>) -> PersistenceResult<u64> {
        let state = self.state.lock().await;
        Ok(query.count(&state.visible().teams()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str) -> Team {
        Team::new(name).expect("valid team").0
    }

    #[tokio::test]
    async fn persist_without_session_fails() {
        let context = InMemoryContext::new();

        let result = context.persist_team(&team("teamA")).await;

        assert!(matches!(result, Err(PersistenceError::NoActiveSession)));
    }

    #[tokio::test]
    async fn commit_without_session_fails() {
        let context = InMemoryContext::new();

        assert!(matches!(
            context.commit().await,
            Err(PersistenceError::NoActiveSession)
        ));
        assert!(matches!(
            context.rollback().await,
            Err(PersistenceError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn nested_begin_fails() {
        let context = InMemoryContext::new();
        context.begin().await.unwrap();

        assert!(matches!(
            context.begin().await,
            Err(PersistenceError::SessionAlreadyActive)
        ));
    }

    #[tokio::test]
    async fn uncommitted_writes_are_visible_only_inside_session() {
        let context = InMemoryContext::new();
        let team_a = team("teamA");

        context.begin().await.unwrap();
        context.persist_team(&team_a).await.unwrap();
        assert!(context.find_team(team_a.id()).await.unwrap().is_some());
        context.rollback().await.unwrap();

        assert!(context.find_team(team_a.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_survive_the_session() {
        let context = InMemoryContext::new();
        let team_a = team("teamA");

        context.begin().await.unwrap();
        context.persist_team(&team_a).await.unwrap();
        context.commit().await.unwrap();

        let found = context.find_team(team_a.id()).await.unwrap();
        assert_eq!(found.map(|t| t.name().to_string()), Some("teamA".to_string()));
    }

    #[tokio::test]
    async fn member_with_unknown_team_is_rejected() {
        let context = InMemoryContext::new();
        let mut team_a = team("teamA");
        let (member, _) = Member::with_team("member1", 10, &mut team_a);

        context.begin().await.unwrap();
        let result = context.persist_member(&member).await;

        assert!(matches!(
            result,
            Err(PersistenceError::MissingReference { table: "team", .. })
        ));
    }

    #[tokio::test]
    async fn loaded_team_carries_member_index() {
        let context = InMemoryContext::new();
        let mut team_a = team("teamA");
        let (member1, _) = Member::with_team("member1", 10, &mut team_a);
        let (member2, _) = Member::with_team("member2", 20, &mut team_a);

        context.begin().await.unwrap();
        context.persist_team(&team_a).await.unwrap();
        context.persist_member(&member1).await.unwrap();
        context.persist_member(&member2).await.unwrap();
        context.commit().await.unwrap();

        let loaded = context.find_team(team_a.id()).await.unwrap().unwrap();
        assert_eq!(loaded.members(), team_a.members());
    }

    #[tokio::test]
    async fn saving_twice_overwrites() {
        let context = InMemoryContext::new();
        let member = Member::new("member1", 10);
        let renamed = Member::from_persistence(member.id(), "renamed".to_string(), 11, None);

        context.begin().await.unwrap();
        context.persist_member(&member).await.unwrap();
        context.persist_member(&renamed).await.unwrap();
        context.commit().await.unwrap();

        let all = context.fetch(&Query::<Member>::new()).await.unwrap();
        assert_eq!(all, vec![renamed]);
    }
}
