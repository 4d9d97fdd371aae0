use async_trait::async_trait;

use crate::domain::member::{Member, MemberId};
use crate::domain::persistence::PersistenceResult;

/// Repository trait for Member
///
/// Lookups by identity and by name. Writes go through the caller's active
/// session on the underlying persistence context.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Register a member in the active session
    async fn save(&self, member: &Member) -> PersistenceResult<()>;

    /// Find a member by its ID; `None` when absent
    async fn find_by_id(&self, id: MemberId) -> PersistenceResult<Option<Member>>;

    /// Find every member, in storage order
    async fn find_all(&self) -> PersistenceResult<Vec<Member>>;

    /// Find all members whose name equals `user_name` exactly (case-sensitive)
    async fn find_by_user_name(&self, user_name: &str) -> PersistenceResult<Vec<Member>>;
}
