use std::sync::Arc;

use serde::{Serialize, Serializer, ser::SerializeMap, ser::SerializeStruct};

use crate::{
    LabeledArray, LabeledCollection, SchemaError,
    check::{ArrayCheckFn, NamedCheck},
    component::{
        ArrayTypeSchema, AttrsSchema, ChunksSchema, DTypeSchema, DimsSchema, NameSchema,
        ShapeSchema, to_json_value,
    },
    error::MemberKind,
};

/// Schema for a single labeled array.
///
/// Every component is optional; an unset component accepts any value.
/// Components are checked in a fixed order (dtype, name, dims, shape, chunks,
/// array type, attrs, coords, then custom checks) and the first failure is returned.
#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    dtype: Option<DTypeSchema>,
    dims: Option<DimsSchema>,
    shape: Option<ShapeSchema>,
    name: Option<NameSchema>,
    chunks: Option<ChunksSchema>,
    array_type: Option<ArrayTypeSchema>,
    attrs: Option<AttrsSchema>,
    coords: Option<CoordsSchema>,
    checks: Vec<NamedCheck<ArrayCheckFn>>,
}

impl ArraySchema {
    /// A schema accepting any array.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dtype(mut self, dtype: impl Into<DTypeSchema>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn with_dims(mut self, dims: impl Into<DimsSchema>) -> Self {
        self.dims = Some(dims.into());
        self
    }

    pub fn with_shape(mut self, shape: impl Into<ShapeSchema>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<NameSchema>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_chunks(mut self, chunks: impl Into<ChunksSchema>) -> Self {
        self.chunks = Some(chunks.into());
        self
    }

    pub fn with_array_type(mut self, array_type: impl Into<ArrayTypeSchema>) -> Self {
        self.array_type = Some(array_type.into());
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

    /// Add a custom check, run after every component.
    pub fn with_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&dyn LabeledArray) -> Result<(), String> + Send + Sync + 'static,
    {
        let check: Arc<ArrayCheckFn> = Arc::new(check);
        self.checks.push(NamedCheck::new(name.into(), check));
        self
    }

    pub fn dtype(&self) -> Option<&DTypeSchema> {
        self.dtype.as_ref()
    }

    pub fn dims(&self) -> Option<&DimsSchema> {
        self.dims.as_ref()
    }

    pub fn shape(&self) -> Option<&ShapeSchema> {
        self.shape.as_ref()
    }

    pub fn name(&self) -> Option<&NameSchema> {
        self.name.as_ref()
    }

    pub fn chunks(&self) -> Option<&ChunksSchema> {
        self.chunks.as_ref()
    }

    pub fn array_type(&self) -> Option<&ArrayTypeSchema> {
        self.array_type.as_ref()
    }

    pub fn attrs(&self) -> Option<&AttrsSchema> {
        self.attrs.as_ref()
    }

    pub fn coords(&self) -> Option<&CoordsSchema> {
        self.coords.as_ref()
    }

    fn run(&self, array: &dyn LabeledArray) -> Result<(), SchemaError> {
        if let Some(dtype) = &self.dtype {
            log::trace!("checking dtype {dtype}");
            dtype.validate(array.dtype())?;
        }
        if let Some(name) = &self.name {
            log::trace!("checking name");
            name.validate(array.name())?;
        }
        if let Some(dims) = &self.dims {
            log::trace!("checking dims");
            dims.validate(array.dims())?;
        }
        if let Some(shape) = &self.shape {
            log::trace!("checking shape");
            shape.validate(array.shape())?;
        }
        if let Some(chunks) = &self.chunks {
            log::trace!("checking chunks");
            chunks.validate(array.chunks(), array.dims())?;
        }
        if let Some(array_type) = &self.array_type {
            log::trace!("checking array type");
            array_type.validate(&array.array_type())?;
        }
        if let Some(attrs) = &self.attrs {
            log::trace!("checking attrs");
            attrs.validate(array.attrs())?;
        }
        if let Some(coords) = &self.coords {
            log::trace!("checking coords");
            coords.validate(array)?;
        }
        for check in &self.checks {
            check.run(array)?;
        }
        Ok(())
    }

    /// Check `array` against this schema, returning it unchanged on success.
    pub fn validate<'a>(
        &self,
        array: &'a dyn LabeledArray,
    ) -> Result<&'a dyn LabeledArray, SchemaError> {
        log::debug!("validating array {:?}", array.name());
        self.run(array).inspect_err(|e| {
            log::debug!("array {:?} failed validation: {e}", array.name());
        })?;
        Ok(array)
    }

    pub fn to_json(&self) -> serde_json::Value {
        to_json_value(self)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Only configured components are rendered. Custom checks are not rendered.
impl Serialize for ArraySchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(dtype) = &self.dtype {
            map.serialize_entry("dtype", dtype)?;
        }
        if let Some(dims) = &self.dims {
            map.serialize_entry("dims", dims)?;
        }
        if let Some(shape) = &self.shape {
            map.serialize_entry("shape", shape)?;
        }
        if let Some(coords) = &self.coords {
            map.serialize_entry("coords", coords)?;
        }
        if let Some(name) = &self.name {
            map.serialize_entry("name", name)?;
        }
        if let Some(chunks) = &self.chunks {
            map.serialize_entry("chunks", chunks)?;
        }
        if let Some(attrs) = &self.attrs {
            map.serialize_entry("attrs", attrs)?;
        }
        if let Some(array_type) = &self.array_type {
            map.serialize_entry("array_type", array_type)?;
        }
        map.end()
    }
}

/// Schema for the coordinate variables of an array or collection.
#[derive(Debug, Clone)]
pub struct CoordsSchema {
    coords: Vec<(String, ArraySchema)>,
    require_all_keys: bool,
    allow_extra_keys: bool,
}

impl CoordsSchema {
    pub fn new<K: Into<String>>(coords: impl IntoIterator<Item = (K, ArraySchema)>) -> Self {
        Self {
            coords: coords.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            require_all_keys: true,
            allow_extra_keys: true,
        }
    }

    /// Whether every declared coordinate must be present. Defaults to `true`.
    pub fn require_all_keys(mut self, require: bool) -> Self {
        self.require_all_keys = require;
        self
    }

    /// Whether coordinates that are not declared are accepted. Defaults to `true`.
    pub fn allow_extra_keys(mut self, allow: bool) -> Self {
        self.allow_extra_keys = allow;
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArraySchema> {
        self.coords.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    fn validate_with<'a>(
        &self,
        names: Vec<&'a str>,
        lookup: impl Fn(&str) -> Option<&'a dyn LabeledArray>,
    ) -> Result<(), SchemaError> {
        for (name, schema) in &self.coords {
            match lookup(name.as_str()) {
                Some(coord) => {
                    schema.validate(coord)?;
                }
                None if self.require_all_keys => {
                    return Err(SchemaError::MissingMember {
                        kind: MemberKind::Coordinate,
                        name: name.clone(),
                    });
                }
                None => log::trace!("skipping absent optional coordinate {name}"),
            }
        }
        if !self.allow_extra_keys
            && let Some(extra) = names.into_iter().find(|n| self.get(n).is_none())
        {
            return Err(SchemaError::UnexpectedMember {
                kind: MemberKind::Coordinate,
                name: extra.to_string(),
            });
        }
        Ok(())
    }

    /// Validate the coordinates of an array.
    pub fn validate(&self, array: &dyn LabeledArray) -> Result<(), SchemaError> {
        self.validate_with(array.coord_names(), |name| array.coord(name))
    }

    /// Validate the coordinates of a collection.
    pub fn validate_collection(&self, collection: &dyn LabeledCollection) -> Result<(), SchemaError> {
        self.validate_with(collection.coord_names(), |name| collection.coord(name))
    }

    pub fn to_json(&self) -> serde_json::Value {
        to_json_value(self)
    }
}

pub(crate) struct NamedSchemas<'a>(pub(crate) &'a [(String, ArraySchema)]);

impl Serialize for NamedSchemas<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl Serialize for CoordsSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CoordsSchema", 3)?;
        state.serialize_field("coords", &NamedSchemas(&self.coords))?;
        state.serialize_field("require_all_keys", &self.require_all_keys)?;
        state.serialize_field("allow_extra_keys", &self.allow_extra_keys)?;
        state.end()
    }
}

impl<K: Into<String>, const N: usize> From<[(K, ArraySchema); N]> for CoordsSchema {
    fn from(value: [(K, ArraySchema); N]) -> Self {
        Self::new(value)
    }
}

impl<K: Into<String>> From<Vec<(K, ArraySchema)>> for CoordsSchema {
    fn from(value: Vec<(K, ArraySchema)>) -> Self {
        Self::new(value)
    }
}
