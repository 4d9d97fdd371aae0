use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::member::{Member, MemberId};
use crate::domain::persistence::{PersistenceContext, PersistenceResult};
use crate::domain::repositories::MemberRepository;
use crate::infrastructure::persistence::PostgresContext;

/// PostgreSQL implementation of MemberRepository using hand-written SQL
///
/// Lookups are plain query strings with bound parameters; writes and
/// identity lookups go through the context so they share its transaction.
pub struct PostgresMemberRepository {
    context: Arc<PostgresContext>,
}

impl PostgresMemberRepository {
    /// Creates a new PostgresMemberRepository
    ///
    /// # Arguments
    /// * `context` - PostgreSQL context the caller opens sessions on
    pub fn new(context: Arc<PostgresContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn save(&self, member: &Member) -> PersistenceResult<()> {
        self.context.persist_member(member).await
    }

    async fn find_by_id(&self, id: MemberId) -> PersistenceResult<Option<Member>> {
        self.context.find_member(id).await
    }

    async fn find_all(&self) -> PersistenceResult<Vec<Member>> {
        self.context
            .fetch_all_as(sqlx::query_as::<_, Member>(
                r#"
                SELECT member_id, user_name, age, team_id
                FROM member
                "#,
            ))
            .await
    }

    async fn find_by_user_name(&self, user_name: &str) -> PersistenceResult<Vec<Member>> {
        self.context
            .fetch_all_as(
                sqlx::query_as::<_, Member>(
                    r#"
                    SELECT member_id, user_name, age, team_id
                    FROM member
                    WHERE user_name = $1
                    "#,
                )
                .bind(user_name),
            )
            .await
    }
}
