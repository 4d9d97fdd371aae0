use std::cmp::Ordering;
use std::fmt;
use std::iter::{once, Once};
use std::marker::PhantomData;
use std::ops::Not;

use super::value::Value;
use super::Entity;

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Goe,
    Lt,
    Loe,
}

impl CompareOp {
    /// SQL spelling of the operator
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Goe => ">=",
            CompareOp::Lt => "<",
            CompareOp::Loe => "<=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Goe => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Loe => ordering != Ordering::Greater,
        }
    }
}

/// Case-sensitive text matching modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
}

impl TextMatch {
    /// Builds a `LIKE` pattern with `%`, `_` and `\` in the needle escaped
    pub fn like_pattern(&self, needle: &str) -> String {
        let mut escaped = String::with_capacity(needle.len() + 2);
        for c in needle.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        match self {
            TextMatch::Contains => format!("%{}%", escaped),
            TextMatch::StartsWith => format!("{}%", escaped),
        }
    }

    fn matches(&self, haystack: &str, needle: &str) -> bool {
        match self {
            TextMatch::Contains => haystack.contains(needle),
            TextMatch::StartsWith => haystack.starts_with(needle),
        }
    }
}

/// Untyped predicate tree, shared by every executor
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        column: &'static str,
        op: CompareOp,
        value: Value,
    },
    Between {
        column: &'static str,
        low: Value,
        high: Value,
    },
    Text {
        column: &'static str,
        mode: TextMatch,
        needle: String,
    },
    IsNull {
        column: &'static str,
        negated: bool,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluates the tree against one row using SQL three-valued logic
    ///
    /// `None` stands for UNKNOWN, which a `WHERE` clause treats as false.
    pub fn evaluate(&self, row: &dyn Fn(&str) -> Value) -> Option<bool> {
        match self {
            Expr::Compare { column, op, value } => {
                row(*column).compare(value).map(|ordering| op.holds(ordering))
            }
            Expr::Between { column, low, high } => {
                let current = row(*column);
                let above = current.compare(low)? != Ordering::Less;
                let below = current.compare(high)? != Ordering::Greater;
                Some(above && below)
            }
            Expr::Text {
                column,
                mode,
                needle,
            } => match row(*column) {
                Value::Text(haystack) => Some(mode.matches(&haystack, needle)),
                _ => None,
            },
            Expr::IsNull { column, negated } => Some(row(*column).is_null() != *negated),
            Expr::And(parts) => {
                let mut result = Some(true);
                for part in parts {
                    match part.evaluate(row) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Expr::Or(parts) => {
                let mut result = Some(false);
                for part in parts {
                    match part.evaluate(row) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Expr::Not(inner) => inner.evaluate(row).map(|v| !v),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { column, op, value } => write!(f, "{} {} {}", column, op.sql(), value),
            Expr::Between { column, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", column, low, high)
            }
            Expr::Text {
                column,
                mode,
                needle,
            } => write!(
                f,
                "{} LIKE '{}'",
                column,
                mode.like_pattern(needle).replace('\'', "''")
            ),
            Expr::IsNull { column, negated } => {
                write!(f, "{} IS {}NULL", column, if *negated { "NOT " } else { "" })
            }
            Expr::And(parts) | Expr::Or(parts) => {
                let separator = if matches!(self, Expr::And(_)) { " AND " } else { " OR " };
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", separator)?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
            Expr::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

/// Boolean condition over the fields of entity `E`
///
/// Predicates are built from typed paths such as `MEMBER.age.eq(10)` and
/// compose with [`and`](Predicate::and), [`or`](Predicate::or) and `!`.
/// A predicate is also an iterator over itself, so it can be passed wherever
/// a list of predicates is accepted.
pub struct Predicate<E> {
    expr: Expr,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Predicate<E> {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _entity: PhantomData,
        }
    }

    /// Returns the untyped tree for executors
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    /// Conjunction; nested conjunctions are flattened
    pub fn and(self, other: Predicate<E>) -> Predicate<E> {
        let mut parts = match self.expr {
            Expr::And(parts) => parts,
            expr => vec![expr],
        };
        match other.expr {
            Expr::And(more) => parts.extend(more),
            expr => parts.push(expr),
        }
        Self::from_expr(Expr::And(parts))
    }

    /// Disjunction; nested disjunctions are flattened
    pub fn or(self, other: Predicate<E>) -> Predicate<E> {
        let mut parts = match self.expr {
            Expr::Or(parts) => parts,
            expr => vec![expr],
        };
        match other.expr {
            Expr::Or(more) => parts.extend(more),
            expr => parts.push(expr),
        }
        Self::from_expr(Expr::Or(parts))
    }

    /// Conjoins every predicate, or returns `None` for an empty list
    pub fn all(predicates: impl IntoIterator<Item = Predicate<E>>) -> Option<Predicate<E>> {
        predicates.into_iter().reduce(Predicate::and)
    }
}

impl<E: Entity> Predicate<E> {
    /// True when the predicate holds for `entity`; UNKNOWN counts as false
    pub fn matches(&self, entity: &E) -> bool {
        self.expr.evaluate(&|column| entity.value(column)) == Some(true)
    }
}

impl<E> Not for Predicate<E> {
    type Output = Predicate<E>;

    fn not(self) -> Self::Output {
        match self.expr {
            Expr::Not(inner) => Self::from_expr(*inner),
            expr => Self::from_expr(Expr::Not(Box::new(expr))),
        }
    }
}

impl<E> IntoIterator for Predicate<E> {
    type Item = Predicate<E>;
    type IntoIter = Once<Predicate<E>>;

    fn into_iter(self) -> Self::IntoIter {
        once(self)
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<E> PartialEq for Predicate<E> {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

impl<E> fmt::Display for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}
