use async_trait::async_trait;
use thiserror::Error;

use crate::domain::member::{Member, MemberId};
use crate::domain::team::{Team, TeamId};
use crate::query::{Entity, Query};

/// Errors raised by persistence contexts and repositories
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Query on {table} expected at most one row but matched {count}")]
    NonUniqueResult { table: &'static str, count: usize },

    #[error("No active session: call begin() before writing")]
    NoActiveSession,

    #[error("A session is already active on this context")]
    SessionAlreadyActive,

    #[error("Referenced {table} row not found: {id}")]
    MissingReference { table: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Identity lookup, writes and transaction scope over durable storage
///
/// One session (unit of work) may be active per context. Writes require an
/// active session and become durable on `commit`. Reads inside a session see
/// its uncommitted writes; reads outside one see committed data only.
#[async_trait]
pub trait PersistenceContext: Send + Sync {
    /// Opens a session
    async fn begin(&self) -> PersistenceResult<()>;

    /// Makes the session's writes durable and closes it
    async fn commit(&self) -> PersistenceResult<()>;

    /// Discards the session's writes and closes it
    async fn rollback(&self) -> PersistenceResult<()>;

    /// Inserts the team row, or overwrites it when the id already exists
    async fn persist_team(&self, team: &Team) -> PersistenceResult<()>;

    /// Inserts the member row, or overwrites it when the id already exists
    ///
    /// Fails with `MissingReference` when the member's team is not stored.
    async fn persist_member(&self, member: &Member) -> PersistenceResult<()>;

    /// Loads a team together with the ids of its members
    async fn find_team(&self, id: TeamId) -> PersistenceResult<Option<Team>>;

    async fn find_member(&self, id: MemberId) -> PersistenceResult<Option<Member>>;
}

/// Runs composed builder queries over entity `E`
#[async_trait]
pub trait QueryExecutor<E: Entity>: Send + Sync {
    async fn fetch(&self, query: &Query<E>) -> PersistenceResult<Vec<E>>;

    async fn count(&self, query: &Query<E>) -> PersistenceResult<u64>;
}
