use std::fmt;

use crate::component::{ArrayType, DType};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    General(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] zarrs::storage::StorageError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Wrapped(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    pub fn wrap(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Wrapped(Box::new(error))
    }
}

/// The kind of container a missing or unexpected member was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A coordinate variable.
    Coordinate,
    /// A data variable of a collection.
    Variable,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Coordinate => write!(f, "coordinate"),
            MemberKind::Variable => write!(f, "variable"),
        }
    }
}

/// Where two sequences (dims or shape) disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMismatch {
    /// The sequences have different lengths.
    Length { expected: usize, actual: usize },
    /// The sequences differ at this axis.
    Axis(usize),
}

impl fmt::Display for SequenceMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceMismatch::Length { expected, actual } => {
                write!(f, "length {actual} != {expected}")
            }
            SequenceMismatch::Axis(axis) => write!(f, "mismatch in axis {axis}"),
        }
    }
}

/// Why an attribute failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrMismatch {
    /// A required key is absent.
    Missing,
    /// A key is present that the schema does not declare.
    Unexpected,
    /// The value has the wrong JSON type.
    Type {
        expected: String,
        actual: serde_json::Value,
    },
    /// The value is not the expected literal.
    Value {
        expected: serde_json::Value,
        actual: serde_json::Value,
    },
    /// A named predicate rejected the value.
    Predicate {
        predicate: String,
        actual: serde_json::Value,
    },
}

impl fmt::Display for AttrMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrMismatch::Missing => write!(f, "missing"),
            AttrMismatch::Unexpected => write!(f, "not declared"),
            AttrMismatch::Type { expected, actual } => {
                write!(f, "{actual} is not of type {expected}")
            }
            AttrMismatch::Value { expected, actual } => write!(f, "{actual} != {expected}"),
            AttrMismatch::Predicate { predicate, actual } => {
                write!(f, "{actual} rejected by {predicate}")
            }
        }
    }
}

/// A validation failure.
///
/// Validation is fail-fast: the first failing check of an aggregate is reported
/// and the remaining checks are not run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("dtype {actual} != {expected}")]
    DTypeMismatch { expected: String, actual: DType },
    #[error("dims {actual:?} do not match {expected:?}: {mismatch}")]
    DimsMismatch {
        expected: Vec<Option<String>>,
        actual: Vec<String>,
        mismatch: SequenceMismatch,
    },
    #[error("shape {actual:?} does not match {expected:?}: {mismatch}")]
    ShapeMismatch {
        expected: Vec<Option<u64>>,
        actual: Vec<u64>,
        mismatch: SequenceMismatch,
    },
    #[error("name {actual:?} != {expected:?}")]
    NameMismatch {
        expected: Option<String>,
        actual: Option<String>,
    },
    #[error("chunks did not match{}: {actual} != {expected}", dim_suffix(.dim))]
    ChunksMismatch {
        dim: Option<String>,
        expected: String,
        actual: String,
    },
    #[error("array_type {actual} is not one of {expected:?}")]
    ArrayTypeMismatch {
        expected: Vec<ArrayType>,
        actual: ArrayType,
    },
    #[error("attrs key {key}: {mismatch}")]
    AttrsMismatch { key: String, mismatch: AttrMismatch },
    #[error("{kind} {name} is missing")]
    MissingMember { kind: MemberKind, name: String },
    #[error("{kind} {name} is not declared")]
    UnexpectedMember { kind: MemberKind, name: String },
    #[error("check {check} failed: {message}")]
    CheckFailed { check: String, message: String },
}

fn dim_suffix(dim: &Option<String>) -> String {
    dim.as_ref().map(|d| format!(" for {d}")).unwrap_or_default()
}
