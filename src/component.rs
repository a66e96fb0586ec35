//! Single-attribute validators.
//!
//! Each component holds one expected value and checks it against the
//! corresponding metadata of a [`LabeledArray`](crate::LabeledArray).

mod array_type;
mod attrs;
mod chunks;
mod dims;
mod dtype;
mod name;
mod shape;

pub use array_type::{ArrayType, ArrayTypeSchema};
pub use attrs::{AttrSchema, AttrType, AttrsSchema};
pub use chunks::{ChunkSize, ChunksSchema, FULL_EXTENT};
pub use dims::DimsSchema;
pub use dtype::{DType, DTypeKind, DTypeSchema};
pub use name::NameSchema;
pub use shape::ShapeSchema;

use serde::{Serialize, Serializer};

/// An expected value at one position of a dims or shape sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Wildcard<T> {
    /// Any value is accepted.
    #[default]
    Any,
    /// Only this value is accepted.
    Exact(T),
}

impl<T: PartialEq> Wildcard<T> {
    /// Whether `actual` is accepted.
    pub fn matches(&self, actual: &T) -> bool {
        match self {
            Wildcard::Any => true,
            Wildcard::Exact(expected) => expected == actual,
        }
    }
}

impl<T: Clone> Wildcard<T> {
    /// The expected value, or `None` for a wildcard.
    pub fn to_option(&self) -> Option<T> {
        match self {
            Wildcard::Any => None,
            Wildcard::Exact(v) => Some(v.clone()),
        }
    }
}

/// Wildcards serialize as `null`.
impl<T: Serialize> Serialize for Wildcard<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Wildcard::Any => serializer.serialize_none(),
            Wildcard::Exact(v) => serializer.serialize_some(v),
        }
    }
}

impl From<u64> for Wildcard<u64> {
    fn from(value: u64) -> Self {
        Self::Exact(value)
    }
}

impl From<Option<u64>> for Wildcard<u64> {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Any, Self::Exact)
    }
}

impl From<&str> for Wildcard<String> {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_string())
    }
}

impl From<String> for Wildcard<String> {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

impl From<Option<&str>> for Wildcard<String> {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Any, |v| Self::Exact(v.to_string()))
    }
}

impl From<Option<String>> for Wildcard<String> {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Any, Self::Exact)
    }
}

/// Render a JSON value for a component.
///
/// Components only hold plain data, so serialization cannot fail.
pub(crate) fn to_json_value<T: Serialize + ?Sized>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).expect("schema should be serializable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches() {
        let any = Wildcard::from(None::<u64>);
        assert!(any.matches(&3));
        let exact = Wildcard::from(4_u64);
        assert!(exact.matches(&4));
        assert!(!exact.matches(&5));
    }

    #[test]
    fn wildcard_serializes_to_null() {
        let dims: Vec<Wildcard<String>> = vec!["x".into(), Wildcard::Any];
        assert_eq!(to_json_value(&dims), serde_json::json!(["x", null]));
    }
}
