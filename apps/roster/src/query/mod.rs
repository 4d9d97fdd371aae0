//! Typed query construction
//!
//! Predicates are assembled from typed field paths (`QMember`, `QTeam`) and
//! handed to a [`QueryExecutor`](crate::domain::persistence::QueryExecutor)
//! only when a terminal operation runs. Field/operator combinations that make
//! no sense for a column's type are rejected by the compiler.

pub mod path;
pub mod predicate;
pub mod select;
pub mod value;

pub use path::{Direction, EntityPath, OrderSpecifier, Path};
pub use predicate::{CompareOp, Expr, Predicate, TextMatch};
pub use select::{Query, QueryFactory, SelectQuery};
pub use value::{FieldType, Value};

/// A persistent record that queries can be issued against
pub trait Entity: Clone + Send + Sync + Unpin + 'static {
    /// Name of the backing table
    const TABLE: &'static str;

    /// Returns the stored value of `column`, or `Value::Null` for unknown columns
    fn value(&self, column: &str) -> Value;
}
