use std::cmp::Ordering;
use std::fmt;

use uuid::Uuid;

/// Column value carried by predicates and read from entities
///
/// Comparisons follow SQL semantics: values of different kinds, or any
/// comparison involving `Null`, are incomparable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Orders two values of the same kind
    ///
    /// Returns `None` when either side is `Null` or the kinds differ.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Uuid(v) => write!(f, "{}", v),
        }
    }
}

/// Rust types that can back a column in a typed [`Path`](super::Path)
pub trait FieldType {
    fn into_value(self) -> Value;
}

impl FieldType for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl FieldType for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn into_value(self) -> Value {
        self.map(FieldType::into_value).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_values_compare() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::Text("b".into()).compare(&Value::Text("a".into())),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn null_is_incomparable() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Int(1).compare(&Value::Null), None);
    }

    #[test]
    fn mixed_kinds_are_incomparable() {
        assert_eq!(Value::Int(1).compare(&Value::Text("1".into())), None);
    }

    #[test]
    fn text_display_doubles_embedded_quotes() {
        assert_eq!(Value::Text("o'brien".into()).to_string(), "'o''brien'");
        assert_eq!(Value::Text("member1".into()).to_string(), "'member1'");
    }

    #[test]
    fn optional_field_maps_none_to_null() {
        assert_eq!(None::<i32>.into_value(), Value::Null);
        assert_eq!(Some(7).into_value(), Value::Int(7));
    }
}
