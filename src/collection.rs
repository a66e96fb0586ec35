use std::sync::Arc;

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    ArraySchema, CoordsSchema, LabeledArray, LabeledCollection, SchemaError,
    array::NamedSchemas,
    check::{CollectionCheckFn, NamedCheck},
    component::{AttrsSchema, to_json_value},
    error::MemberKind,
    labeled::SingleArrayCollection,
};

/// Schema for a named collection of labeled arrays.
///
/// Declared members are checked in declaration order, then (when configured)
/// undeclared members, collection attributes, collection coordinates and custom checks.
/// The first failure is returned.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    members: Vec<(String, ArraySchema)>,
    allow_extra_members: bool,
    attrs: Option<AttrsSchema>,
    coords: Option<CoordsSchema>,
    checks: Vec<NamedCheck<CollectionCheckFn>>,
}

impl Default for CollectionSchema {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            allow_extra_members: true,
            attrs: None,
            coords: None,
            checks: Vec::new(),
        }
    }
}

impl CollectionSchema {
    pub fn new<K: Into<String>>(members: impl IntoIterator<Item = (K, ArraySchema)>) -> Self {
        Self {
            members: members.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Default::default()
        }
    }

    /// Add or replace the schema for a member.
    pub fn with_member(mut self, name: impl Into<String>, schema: ArraySchema) -> Self {
        let name = name.into();
        match self.members.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = schema,
            None => self.members.push((name, schema)),
        }
        self
    }

    /// Whether members that are not declared are accepted. Defaults to `true`.
    pub fn allow_extra_members(mut self, allow: bool) -> Self {
        self.allow_extra_members = allow;
        self
    }

    pub fn with_attrs(mut self, attrs: impl Into<AttrsSchema>) -> Self {
        self.attrs = Some(attrs.into());
        self
    }

    pub fn with_coords(mut self, coords: impl Into<CoordsSchema>) -> Self {
        self.coords = Some(coords.into());
        self
    }

    /// Add a custom check, run after every other check.
    pub fn with_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&dyn LabeledCollection) -> Result<(), String> + Send + Sync + 'static,
    {
        let check: Arc<CollectionCheckFn> = Arc::new(check);
        self.checks.push(NamedCheck::new(name.into(), check));
        self
    }

    pub fn member(&self, name: &str) -> Option<&ArraySchema> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(n, _)| n.as_str())
    }

    fn run(&self, collection: &dyn LabeledCollection) -> Result<(), SchemaError> {
        for (name, schema) in &self.members {
            let Some(member) = collection.member(name) else {
                return Err(SchemaError::MissingMember {
                    kind: MemberKind::Variable,
                    name: name.clone(),
                });
            };
            schema.validate(member)?;
        }
        if !self.allow_extra_members
            && let Some(extra) = collection
                .member_names()
                .into_iter()
                .find(|n| self.member(n).is_none())
        {
            return Err(SchemaError::UnexpectedMember {
                kind: MemberKind::Variable,
                name: extra.to_string(),
            });
        }
        if let Some(attrs) = &self.attrs {
            log::trace!("checking collection attrs");
            attrs.validate(collection.attrs())?;
        }
        if let Some(coords) = &self.coords {
            log::trace!("checking collection coords");
            coords.validate_collection(collection)?;
        }
        for check in &self.checks {
            check.run(collection)?;
        }
        Ok(())
    }

    /// Check `collection` against this schema, returning it unchanged on success.
    pub fn validate<'a>(
        &self,
        collection: &'a dyn LabeledCollection,
    ) -> Result<&'a dyn LabeledCollection, SchemaError> {
        log::debug!(
            "validating collection with {} declared members",
            self.members.len()
        );
        self.run(collection).inspect_err(|e| {
            log::debug!("collection failed validation: {e}");
        })?;
        Ok(collection)
    }

    /// Check a named array as a collection with that array as its only member.
    pub fn validate_array<'a>(
        &self,
        array: &'a dyn LabeledArray,
    ) -> Result<&'a dyn LabeledArray, SchemaError> {
        self.validate(&SingleArrayCollection::new(array))?;
        Ok(array)
    }

    pub fn to_json(&self) -> serde_json::Value {
        to_json_value(self)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Custom checks and the extra member policy are not rendered.
impl Serialize for CollectionSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("data_vars", &NamedSchemas(&self.members))?;
        match &self.attrs {
            Some(attrs) => map.serialize_entry("attrs", attrs)?,
            None => map.serialize_entry("attrs", &serde_json::Map::new())?,
        }
        if let Some(coords) = &self.coords {
            map.serialize_entry("coords", coords)?;
        }
        map.end()
    }
}

impl<K: Into<String>, const N: usize> From<[(K, ArraySchema); N]> for CollectionSchema {
    fn from(value: [(K, ArraySchema); N]) -> Self {
        Self::new(value)
    }
}
