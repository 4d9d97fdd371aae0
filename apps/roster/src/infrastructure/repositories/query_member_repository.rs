use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::member::{Member, MemberId, MEMBER};
use crate::domain::persistence::{PersistenceContext, PersistenceResult, QueryExecutor};
use crate::domain::repositories::MemberRepository;
use crate::query::QueryFactory;

/// MemberRepository built on the typed query builder
///
/// Works with any persistence context that can execute member queries, so
/// the same code runs against PostgreSQL and the in-memory store.
pub struct QueryMemberRepository<C> {
    context: Arc<C>,
}

impl<C> QueryMemberRepository<C> {
    /// Creates a new QueryMemberRepository
    ///
    /// # Arguments
    /// * `context` - Persistence context the caller opens sessions on
    pub fn new(context: Arc<C>) -> Self {
        Self { context }
    }

    fn query_factory(&self) -> QueryFactory<'_, C> {
        QueryFactory::new(&*self.context)
    }
}

#[async_trait]
impl<C> MemberRepository for QueryMemberRepository<C>
where
    C: PersistenceContext + QueryExecutor<Member>,
{
    async fn save(&self, member: &Member) -> PersistenceResult<()> {
        self.context.persist_member(member).await
    }

    async fn find_by_id(&self, id: MemberId) -> PersistenceResult<Option<Member>> {
        self.context.find_member(id).await
    }

    async fn find_all(&self) -> PersistenceResult<Vec<Member>> {
        self.query_factory().select_from(MEMBER).fetch().await
    }

    async fn find_by_user_name(&self, user_name: &str) -> PersistenceResult<Vec<Member>> {
        self.query_factory()
            .select_from(MEMBER)
            .filter(MEMBER.user_name.eq(user_name))
            .fetch()
            .await
    }
}
