use std::cmp::Ordering;
use std::fmt;

use super::path::{Direction, EntityPath, OrderSpecifier};
use super::predicate::{Expr, Predicate};
use super::Entity;
use crate::domain::persistence::{PersistenceError, PersistenceResult, QueryExecutor};

/// Fully described select over one entity
///
/// All filters are conjoined. A `Query` performs no I/O; executors turn it
/// into SQL or evaluate it against in-process rows.
pub struct Query<E> {
    predicates: Vec<Predicate<E>>,
    order: Vec<OrderSpecifier<E>>,
    limit: Option<u64>,
}

impl<E> Query<E> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Conjunction of every filter, or `None` when unfiltered
    pub fn predicate(&self) -> Option<Expr> {
        Predicate::all(self.predicates.iter().cloned()).map(Predicate::into_expr)
    }

    pub fn order(&self) -> &[OrderSpecifier<E>] {
        &self.order
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    fn push_filter(&mut self, predicates: impl IntoIterator<Item = Predicate<E>>) {
        self.predicates.extend(predicates);
    }
}

impl<E: Entity> Query<E> {
    pub fn table(&self) -> &'static str {
        E::TABLE
    }

    pub fn matches(&self, entity: &E) -> bool {
        self.predicates.iter().all(|p| p.matches(entity))
    }

    /// Filters, sorts and truncates in-process rows
    ///
    /// Ties keep their storage order. Nulls sort last ascending and first
    /// descending, as PostgreSQL does by default.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a E>) -> Vec<E> {
        let mut selected: Vec<E> = rows
            .into_iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect();

        if !self.order.is_empty() {
            selected.sort_by(|a, b| self.compare_rows(a, b));
        }
        if let Some(limit) = self.limit {
            selected.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        selected
    }

    /// Number of in-process rows matching the filters; order and limit are ignored
    pub fn count<'a>(&self, rows: impl IntoIterator<Item = &'a E>) -> u64 {
        rows.into_iter().filter(|row| self.matches(row)).count() as u64
    }

    fn compare_rows(&self, a: &E, b: &E) -> Ordering {
        for spec in &self.order {
            let left = a.value(spec.column());
            let right = b.value(spec.column());
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
            };
            let ordering = match spec.direction() {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl<E> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            order: self.order.clone(),
            limit: self.limit,
        }
    }
}

impl<E> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("predicates", &self.predicates)
            .field("order", &self.order)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Entry point for builder queries against a persistence context
///
/// # Example
/// ```
/// use roster::domain::member::MEMBER;
/// use roster::infrastructure::persistence::InMemoryContext;
/// use roster::query::QueryFactory;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let context = InMemoryContext::new();
/// let members = QueryFactory::new(&context)
///     .select_from(MEMBER)
///     .filter(MEMBER.user_name.eq("member1"))
///     .fetch()
///     .await
///     .expect("query runs");
/// assert!(members.is_empty());
/// # });
/// ```
pub struct QueryFactory<'c, C: ?Sized> {
    context: &'c C,
}

impl<'c, C: ?Sized> QueryFactory<'c, C> {
    pub fn new(context: &'c C) -> Self {
        Self { context }
    }

    /// Starts a select over the entity behind `entity`
    pub fn select_from<P: EntityPath>(&self, _entity: P) -> SelectQuery<'c, C, P::Entity> {
        SelectQuery {
            context: self.context,
            query: Query::new(),
        }
    }
}

/// Query under construction, bound to the context that will run it
///
/// Nothing executes until a terminal operation (`fetch`, `fetch_one`,
/// `fetch_first`, `fetch_count`) is awaited. Every terminal call issues a
/// fresh query; results are never cached.
pub struct SelectQuery<'c, C: ?Sized, E> {
    context: &'c C,
    query: Query<E>,
}

impl<'c, C: ?Sized, E: Entity> SelectQuery<'c, C, E> {
    /// Adds filters; everything passed here and in earlier calls is conjoined
    ///
    /// Accepts a single predicate or any collection of them, so
    /// `filter([a, b])` and `filter(a.and(b))` select the same rows.
    pub fn filter(mut self, predicates: impl IntoIterator<Item = Predicate<E>>) -> Self {
        self.query.push_filter(predicates);
        self
    }

    pub fn order_by(mut self, order: impl IntoIterator<Item = OrderSpecifier<E>>) -> Self {
        self.query.order.extend(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn query(&self) -> &Query<E> {
        &self.query
    }
}

impl<'c, C, E> SelectQuery<'c, C, E>
where
    C: QueryExecutor<E> + ?Sized,
    E: Entity,
{
    /// Every matching row
    pub async fn fetch(&self) -> PersistenceResult<Vec<E>> {
        self.context.fetch(&self.query).await
    }

    /// The only matching row
    ///
    /// # Errors
    /// `NonUniqueResult` when more than one row matches.
    pub async fn fetch_one(&self) -> PersistenceResult<Option<E>> {
        let mut rows = self.context.fetch(&self.query).await?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            count => Err(PersistenceError::NonUniqueResult {
                table: E::TABLE,
                count,
            }),
        }
    }

    /// The first matching row in query order, without an ambiguity check
    pub async fn fetch_first(&self) -> PersistenceResult<Option<E>> {
        let mut query = self.query.clone();
        query.limit = Some(1);
        Ok(self.context.fetch(&query).await?.into_iter().next())
    }

    /// Number of matching rows, ignoring order and limit
    pub async fn fetch_count(&self) -> PersistenceResult<u64> {
        self.context.count(&self.query).await
    }
}
