use std::{fmt, sync::Arc};

use serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeStruct};
use serde_json::{Map, Value};

use crate::{SchemaError, error::AttrMismatch};

/// The JSON type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    String,
    /// Any number, integer or not.
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl AttrType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            AttrType::String => value.is_string(),
            AttrType::Number => value.is_number(),
            AttrType::Integer => value.is_i64() || value.is_u64(),
            AttrType::Boolean => value.is_boolean(),
            AttrType::Array => value.is_array(),
            AttrType::Object => value.is_object(),
            AttrType::Null => value.is_null(),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::String => "string",
            AttrType::Number => "number",
            AttrType::Integer => "integer",
            AttrType::Boolean => "boolean",
            AttrType::Array => "array",
            AttrType::Object => "object",
            AttrType::Null => "null",
        };
        f.write_str(name)
    }
}

type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

#[derive(Clone)]
struct Predicate {
    name: String,
    check: Arc<PredicateFn>,
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// Attribute schema.
///
/// Every configured constraint (type, literal value, predicate) must hold.
/// With none configured, the attribute only has to be present.
#[derive(Debug, Clone, Default)]
pub struct AttrSchema {
    attr_type: Option<AttrType>,
    value: Option<Value>,
    predicate: Option<Predicate>,
}

impl AttrSchema {
    /// Require only that the attribute is present.
    pub fn present() -> Self {
        Self::default()
    }

    /// Require the attribute to equal `value`.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::default().with_value(value)
    }

    /// Require the attribute to have JSON type `attr_type`.
    pub fn of_type(attr_type: AttrType) -> Self {
        Self::default().with_type(attr_type)
    }

    /// Require `check` to accept the attribute. `name` identifies the predicate in errors and JSON.
    pub fn predicate(
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::default().with_predicate(name, check)
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_type(mut self, attr_type: AttrType) -> Self {
        self.attr_type = Some(attr_type);
        self
    }

    pub fn with_predicate(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Predicate {
            name: name.into(),
            check: Arc::new(check),
        });
        self
    }

    fn check(&self, value: &Value) -> Result<(), AttrMismatch> {
        if let Some(attr_type) = self.attr_type
            && !attr_type.matches(value)
        {
            return Err(AttrMismatch::Type {
                expected: attr_type.to_string(),
                actual: value.clone(),
            });
        }
        if let Some(expected) = &self.value
            && expected != value
        {
            return Err(AttrMismatch::Value {
                expected: expected.clone(),
                actual: value.clone(),
            });
        }
        if let Some(predicate) = &self.predicate
            && !(predicate.check)(value)
        {
            return Err(AttrMismatch::Predicate {
                predicate: predicate.name.clone(),
                actual: value.clone(),
            });
        }
        Ok(())
    }

    /// Validate the attribute `key` of `attrs`, which must be present.
    pub fn validate(&self, key: &str, attrs: &Map<String, Value>) -> Result<(), SchemaError> {
        let result = match attrs.get(key) {
            Some(value) => self.check(value),
            None => Err(AttrMismatch::Missing),
        };
        result.map_err(|mismatch| SchemaError::AttrsMismatch {
            key: key.to_string(),
            mismatch,
        })
    }

    pub fn to_json(&self) -> Value {
        super::to_json_value(self)
    }
}

impl Serialize for AttrSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.predicate.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("AttrSchema", len)?;
        state.serialize_field("type", &self.attr_type)?;
        state.serialize_field("value", &self.value)?;
        if let Some(predicate) = &self.predicate {
            state.serialize_field("predicate", &predicate.name)?;
        }
        state.end()
    }
}

impl From<Value> for AttrSchema {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}

impl From<&str> for AttrSchema {
    fn from(value: &str) -> Self {
        Self::value(value)
    }
}

impl From<AttrType> for AttrSchema {
    fn from(value: AttrType) -> Self {
        Self::of_type(value)
    }
}

/// Attributes schema.
///
/// Declared keys are checked in declaration order.
#[derive(Debug, Clone)]
pub struct AttrsSchema {
    attrs: Vec<(String, AttrSchema)>,
    require_all_keys: bool,
    allow_extra_keys: bool,
}

impl AttrsSchema {
    pub fn new<I, K, V>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrSchema>,
    {
        Self {
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            require_all_keys: true,
            allow_extra_keys: true,
        }
    }

    /// Whether every declared key must be present. Defaults to `true`.
    pub fn require_all_keys(mut self, require: bool) -> Self {
        self.require_all_keys = require;
        self
    }

    /// Whether keys that are not declared are accepted. Defaults to `true`.
    pub fn allow_extra_keys(mut self, allow: bool) -> Self {
        self.allow_extra_keys = allow;
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrSchema> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn validate(&self, attrs: &Map<String, Value>) -> Result<(), SchemaError> {
        for (key, attr_schema) in &self.attrs {
            if !self.require_all_keys && !attrs.contains_key(key) {
                log::trace!("skipping absent optional attribute {key}");
                continue;
            }
            attr_schema.validate(key, attrs)?;
        }
        if !self.allow_extra_keys
            && let Some(extra) = attrs.keys().find(|k| self.get(k).is_none())
        {
            return Err(SchemaError::AttrsMismatch {
                key: extra.clone(),
                mismatch: AttrMismatch::Unexpected,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        super::to_json_value(self)
    }
}

struct AttrsMap<'a>(&'a [(String, AttrSchema)]);

impl Serialize for AttrsMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, attr) in self.0 {
            map.serialize_entry(key, attr)?;
        }
        map.end()
    }
}

impl Serialize for AttrsSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AttrsSchema", 3)?;
        state.serialize_field("require_all_keys", &self.require_all_keys)?;
        state.serialize_field("allow_extra_keys", &self.allow_extra_keys)?;
        state.serialize_field("attrs", &AttrsMap(&self.attrs))?;
        state.end()
    }
}

impl<K: Into<String>, V: Into<AttrSchema>, const N: usize> From<[(K, V); N]> for AttrsSchema {
    fn from(value: [(K, V); N]) -> Self {
        Self::new(value)
    }
}

impl<K: Into<String>, V: Into<AttrSchema>> From<Vec<(K, V)>> for AttrsSchema {
    fn from(value: Vec<(K, V)>) -> Self {
        Self::new(value)
    }
}
