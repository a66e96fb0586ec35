use serde::Serialize;

use crate::SchemaError;

/// Name schema.
///
/// `None` requires the array to be unnamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameSchema {
    name: Option<String>,
}

impl NameSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Require the array to have no name.
    pub fn unnamed() -> Self {
        Self { name: None }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    // TODO: regular expression names
    pub fn validate(&self, name: Option<&str>) -> Result<(), SchemaError> {
        if self.name.as_deref() == name {
            Ok(())
        } else {
            Err(SchemaError::NameMismatch {
                expected: self.name.clone(),
                actual: name.map(str::to_string),
            })
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        super::to_json_value(self)
    }
}

impl From<&str> for NameSchema {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NameSchema {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Option<&str>> for NameSchema {
    fn from(value: Option<&str>) -> Self {
        value.map_or_else(Self::unnamed, Self::new)
    }
}
