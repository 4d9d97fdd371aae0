// Persistence context adapters
// Implement the domain persistence ports against PostgreSQL or process memory

pub mod in_memory;
pub mod postgres;
pub mod schema;

pub use in_memory::InMemoryContext;
pub use postgres::{PgEntity, PostgresContext};
