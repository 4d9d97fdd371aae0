// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod postgres_member_repository;
pub mod query_member_repository;

pub use postgres_member_repository::PostgresMemberRepository;
pub use query_member_repository::QueryMemberRepository;
