use std::fmt;
use std::iter::{once, Once};
use std::marker::PhantomData;

use super::predicate::{CompareOp, Expr, Predicate, TextMatch};
use super::value::FieldType;
use super::Entity;

/// Typed reference to column `column` of entity `E`, holding values of type `T`
///
/// The operators available depend on `T`: every path supports `eq`/`ne`,
/// integer paths add ordering comparisons, text paths add `contains` and
/// `starts_with`, and nullable paths add null checks.
///
/// # Example
/// ```
/// use roster::domain::member::MEMBER;
///
/// let predicate = MEMBER.user_name.eq("member1").and(MEMBER.age.goe(10));
/// assert_eq!(predicate.to_string(), "(user_name = 'member1' AND age >= 10)");
/// ```
///
/// Operators that do not fit the column type are rejected at build time.
/// Text matching on an integer column:
/// ```compile_fail
/// use roster::domain::member::MEMBER;
///
/// let _ = MEMBER.age.contains("1");
/// ```
///
/// Ordering comparisons on a text column:
/// ```compile_fail
/// use roster::domain::member::MEMBER;
///
/// let _ = MEMBER.user_name.goe(3);
/// ```
///
/// `gt`, `lt` and friends on a non-integer path resolve to the `Iterator`
/// methods of the same name, so the compiler reports "is not an iterator":
/// ```compile_fail
/// use roster::domain::member::MEMBER;
///
/// let _ = MEMBER.user_name.gt(3);
/// ```
///
/// Null checks on a column that cannot be null:
/// ```compile_fail
/// use roster::domain::member::MEMBER;
///
/// let _ = MEMBER.age.is_null();
/// ```
pub struct Path<E, T> {
    column: &'static str,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Path<E, T> {
    pub const fn new(column: &'static str) -> Self {
        Self {
            column,
            _marker: PhantomData,
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn asc(self) -> OrderSpecifier<E> {
        OrderSpecifier::new(self.column, Direction::Asc)
    }

    pub fn desc(self) -> OrderSpecifier<E> {
        OrderSpecifier::new(self.column, Direction::Desc)
    }

    fn compare(self, op: CompareOp, value: T) -> Predicate<E>
    where
        T: FieldType,
    {
        Predicate::from_expr(Expr::Compare {
            column: self.column,
            op,
            value: value.into_value(),
        })
    }
}

impl<E, T: FieldType> Path<E, T> {
    pub fn eq(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(CompareOp::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<T>) -> Predicate<E> {
        self.compare(CompareOp::Ne, value.into())
    }
}

impl<E> Path<E, i32> {
    pub fn gt(self, value: i32) -> Predicate<E> {
        self.compare(CompareOp::Gt, value)
    }

    pub fn goe(self, value: i32) -> Predicate<E> {
        self.compare(CompareOp::Goe, value)
    }

    pub fn lt(self, value: i32) -> Predicate<E> {
        self.compare(CompareOp::Lt, value)
    }

    pub fn loe(self, value: i32) -> Predicate<E> {
        self.compare(CompareOp::Loe, value)
    }

    /// Inclusive on both ends
    pub fn between(self, low: i32, high: i32) -> Predicate<E> {
        Predicate::from_expr(Expr::Between {
            column: self.column,
            low: low.into_value(),
            high: high.into_value(),
        })
    }
}

impl<E> Path<E, String> {
    pub fn contains(self, needle: impl Into<String>) -> Predicate<E> {
        self.text(TextMatch::Contains, needle.into())
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> Predicate<E> {
        self.text(TextMatch::StartsWith, prefix.into())
    }

    fn text(self, mode: TextMatch, needle: String) -> Predicate<E> {
        Predicate::from_expr(Expr::Text {
            column: self.column,
            mode,
            needle,
        })
    }
}

impl<E, T> Path<E, Option<T>> {
    pub fn is_null(self) -> Predicate<E> {
        Predicate::from_expr(Expr::IsNull {
            column: self.column,
            negated: false,
        })
    }

    pub fn is_not_null(self) -> Predicate<E> {
        Predicate::from_expr(Expr::IsNull {
            column: self.column,
            negated: true,
        })
    }
}

impl<E, T> Clone for Path<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Path<E, T> {}

impl<E, T> fmt::Debug for Path<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.column).finish()
    }
}

/// Root of a generated path set (`QMember`, `QTeam`)
pub trait EntityPath: Copy {
    type Entity: Entity;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Sort key for a query over `E`
pub struct OrderSpecifier<E> {
    column: &'static str,
    direction: Direction,
    _entity: PhantomData<fn() -> E>,
}

impl<E> OrderSpecifier<E> {
    fn new(column: &'static str, direction: Direction) -> Self {
        Self {
            column,
            direction,
            _entity: PhantomData,
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<E> IntoIterator for OrderSpecifier<E> {
    type Item = OrderSpecifier<E>;
    type IntoIter = Once<OrderSpecifier<E>>;

    fn into_iter(self) -> Self::IntoIter {
        once(self)
    }
}

impl<E> Clone for OrderSpecifier<E> {
    fn clone(&self) -> Self {
        Self::new(self.column, self.direction)
    }
}

impl<E> fmt::Debug for OrderSpecifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSpecifier")
            .field("column", &self.column)
            .field("direction", &self.direction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Value;

    struct Row;

    const AGE: Path<Row, i32> = Path::new("age");
    const NAME: Path<Row, String> = Path::new("user_name");
    const TEAM: Path<Row, Option<i32>> = Path::new("team_id");

    #[test]
    fn eq_on_text_path_accepts_str() {
        let p = NAME.eq("member1");
        assert_eq!(
            p.expr(),
            &Expr::Compare {
                column: "user_name",
                op: CompareOp::Eq,
                value: Value::Text("member1".to_string()),
            }
        );
    }

    #[test]
    fn between_is_inclusive() {
        let expr = AGE.between(10, 20).into_expr();
        assert_eq!(expr.evaluate(&|_: &str| Value::Int(10)), Some(true));
        assert_eq!(expr.evaluate(&|_: &str| Value::Int(20)), Some(true));
        assert_eq!(expr.evaluate(&|_: &str| Value::Int(21)), Some(false));
    }

    #[test]
    fn null_checks_on_optional_path() {
        let expr = TEAM.is_null().into_expr();
        assert_eq!(expr.evaluate(&|_: &str| Value::Null), Some(true));

        let expr = TEAM.is_not_null().into_expr();
        assert_eq!(expr.evaluate(&|_: &str| Value::Int(3)), Some(true));
    }

    #[test]
    fn eq_on_optional_path_binds_inner_value() {
        let p = TEAM.eq(3);
        assert_eq!(p.to_string(), "team_id = 3");
    }

    #[test]
    fn order_specifiers_carry_direction() {
        assert_eq!(AGE.asc().direction(), Direction::Asc);
        assert_eq!(NAME.desc().direction(), Direction::Desc);
        assert_eq!(NAME.desc().column(), "user_name");
    }
}
