use std::{any::TypeId, fmt};

use serde::{Serialize, Serializer};

use crate::SchemaError;

/// The concrete container type backing a labeled array.
///
/// Compared by [`TypeId`]; the type name is kept for diagnostics and JSON output.
#[derive(Debug, Clone, Copy)]
pub struct ArrayType {
    id: TypeId,
    name: &'static str,
}

impl ArrayType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ArrayType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArrayType {}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for ArrayType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Array type schema.
///
/// The actual type must be exactly one of the accepted types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayTypeSchema {
    array_types: Vec<ArrayType>,
}

impl ArrayTypeSchema {
    pub fn new(array_type: ArrayType) -> Self {
        Self {
            array_types: vec![array_type],
        }
    }

    pub fn any_of(array_types: impl IntoIterator<Item = ArrayType>) -> Self {
        Self {
            array_types: array_types.into_iter().collect(),
        }
    }

    pub fn array_types(&self) -> &[ArrayType] {
        &self.array_types
    }

    pub fn validate(&self, array_type: &ArrayType) -> Result<(), SchemaError> {
        if self.array_types.contains(array_type) {
            Ok(())
        } else {
            Err(SchemaError::ArrayTypeMismatch {
                expected: self.array_types.clone(),
                actual: *array_type,
            })
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        super::to_json_value(self)
    }
}

/// A single type renders as its name, several as a list of names.
impl Serialize for ArrayTypeSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.array_types.as_slice() {
            [single] => single.serialize(serializer),
            many => many.serialize(serializer),
        }
    }
}

impl From<ArrayType> for ArrayTypeSchema {
    fn from(value: ArrayType) -> Self {
        Self::new(value)
    }
}
