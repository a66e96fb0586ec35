use serde::Serialize;

use super::Wildcard;
use crate::{SchemaError, error::SequenceMismatch};

/// Dimensions schema.
///
/// An ordered sequence of dimension names; [`Wildcard::Any`] accepts any name at that axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DimsSchema {
    dims: Vec<Wildcard<String>>,
}

impl DimsSchema {
    pub fn new<I>(dims: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Wildcard<String>>,
    {
        Self {
            dims: dims.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dims(&self) -> &[Wildcard<String>] {
        &self.dims
    }

    pub fn validate(&self, dims: &[String]) -> Result<(), SchemaError> {
        let mismatch = if self.dims.len() != dims.len() {
            Some(SequenceMismatch::Length {
                expected: self.dims.len(),
                actual: dims.len(),
            })
        } else {
            self.dims
                .iter()
                .zip(dims)
                .position(|(expected, actual)| !expected.matches(actual))
                .map(SequenceMismatch::Axis)
        };
        match mismatch {
            None => Ok(()),
            Some(mismatch) => Err(SchemaError::DimsMismatch {
                expected: self.dims.iter().map(Wildcard::to_option).collect(),
                actual: dims.to_vec(),
                mismatch,
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        super::to_json_value(self)
    }
}

impl<T: Into<Wildcard<String>>> From<Vec<T>> for DimsSchema {
    fn from(value: Vec<T>) -> Self {
        Self::new(value)
    }
}

impl<T: Into<Wildcard<String>>, const N: usize> From<[T; N]> for DimsSchema {
    fn from(value: [T; N]) -> Self {
        Self::new(value)
    }
}
