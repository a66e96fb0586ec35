use serde::Serialize;

use super::Wildcard;
use crate::{SchemaError, error::SequenceMismatch};

/// Shape schema.
///
/// An ordered sequence of extents; [`Wildcard::Any`] accepts any extent at that axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ShapeSchema {
    shape: Vec<Wildcard<u64>>,
}

impl ShapeSchema {
    pub fn new<I>(shape: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Wildcard<u64>>,
    {
        Self {
            shape: shape.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shape(&self) -> &[Wildcard<u64>] {
        &self.shape
    }

    pub fn validate(&self, shape: &[u64]) -> Result<(), SchemaError> {
        let mismatch = if self.shape.len() != shape.len() {
            Some(SequenceMismatch::Length {
                expected: self.shape.len(),
                actual: shape.len(),
            })
        } else {
            self.shape
                .iter()
                .zip(shape)
                .position(|(expected, actual)| !expected.matches(actual))
                .map(SequenceMismatch::Axis)
        };
        if let Some(mismatch) = mismatch {
            return Err(SchemaError::ShapeMismatch {
                expected: self.shape.iter().map(Wildcard::to_option).collect(),
                actual: shape.to_vec(),
                mismatch,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        super::to_json_value(self)
    }
}

impl<T: Into<Wildcard<u64>>> From<Vec<T>> for ShapeSchema {
    fn from(value: Vec<T>) -> Self {
        Self::new(value)
    }
}

impl<T: Into<Wildcard<u64>>, const N: usize> From<[T; N]> for ShapeSchema {
    fn from(value: [T; N]) -> Self {
        Self::new(value)
    }
}
