//! Owned, in-memory labeled arrays and collections.
//!
//! These hold metadata only. They are the simplest [`LabeledArray`] and
//! [`LabeledCollection`] implementations, useful for describing arrays from
//! other libraries or for testing schemas.

use serde_json::{Map, Value};

use crate::{
    component::{ArrayType, DType},
    labeled::{Chunks, DimChunks, LabeledArray, LabeledCollection, regular_chunks},
};

/// An in-memory labeled array.
#[derive(Debug, Clone)]
pub struct InMemoryArray {
    dtype: DType,
    dims: Vec<String>,
    shape: Vec<u64>,
    chunks: Option<Chunks>,
    name: Option<String>,
    attrs: Map<String, Value>,
    array_type: ArrayType,
    coords: Vec<(String, InMemoryArray)>,
}

impl InMemoryArray {
    /// Create an unnamed, unchunked array.
    ///
    /// # Errors
    /// If the number of dimension names does not match the number of dimensions.
    pub fn new<D: Into<String>>(
        dtype: DType,
        dims: impl IntoIterator<Item = D>,
        shape: impl IntoIterator<Item = u64>,
    ) -> crate::Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        let shape: Vec<u64> = shape.into_iter().collect();
        if dims.len() != shape.len() {
            return Err(crate::Error::general(format!(
                "{} dimension names for {} dimensions",
                dims.len(),
                shape.len()
            )));
        }
        Ok(Self {
            dtype,
            dims,
            shape,
            chunks: None,
            name: None,
            attrs: Map::new(),
            array_type: ArrayType::of::<Self>(),
            coords: Vec::new(),
        })
    }

    /// A one-dimensional array whose only dimension shares its name, as used for index coordinates.
    pub fn index(name: impl Into<String>, dtype: DType, len: u64) -> Self {
        let name = name.into();
        Self {
            dtype,
            dims: vec![name.clone()],
            shape: vec![len],
            chunks: None,
            name: Some(name),
            attrs: Map::new(),
            array_type: ArrayType::of::<Self>(),
            coords: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set explicit chunk extents along each dimension.
    ///
    /// # Errors
    /// If there is not one entry per dimension, or the extents along a dimension
    /// contain a zero or do not sum to its length.
    pub fn with_chunks(mut self, chunks: Vec<Vec<u64>>) -> crate::Result<Self> {
        if chunks.len() != self.shape.len() {
            return Err(crate::Error::general(format!(
                "chunks given for {} of {} dimensions",
                chunks.len(),
                self.shape.len()
            )));
        }
        let chunks = chunks
            .into_iter()
            .zip(&self.shape)
            .map(|(sizes, &extent)| DimChunks::varying(sizes, extent))
            .collect::<crate::Result<Chunks>>()?;
        self.chunks = Some(chunks);
        Ok(self)
    }

    /// Chunk every dimension regularly with the given chunk shape.
    pub fn with_chunk_shape(mut self, chunk_shape: &[u64]) -> crate::Result<Self> {
        self.chunks = Some(regular_chunks(&self.shape, chunk_shape)?);
        Ok(self)
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_attrs(mut self, attrs: Map<String, Value>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_array_type(mut self, array_type: ArrayType) -> Self {
        self.array_type = array_type;
        self
    }

    /// Attach a coordinate variable, named `name`.
    pub fn with_coord(mut self, name: impl Into<String>, coord: InMemoryArray) -> Self {
        let name = name.into();
        let coord = coord.with_name(name.clone());
        match self.coords.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = coord,
            None => self.coords.push((name, coord)),
        }
        self
    }

    fn has_coord(&self, name: &str) -> bool {
        self.coords.iter().any(|(n, _)| n == name)
    }
}

impl LabeledArray for InMemoryArray {
    fn dtype(&self) -> &DType {
        &self.dtype
    }

    fn dims(&self) -> &[String] {
        &self.dims
    }

    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn chunks(&self) -> Option<&[DimChunks]> {
        self.chunks.as_deref()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    fn array_type(&self) -> ArrayType {
        self.array_type
    }

    fn coord_names(&self) -> Vec<&str> {
        self.coords.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn coord(&self, name: &str) -> Option<&dyn LabeledArray> {
        self.coords
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c as &dyn LabeledArray)
    }
}

/// An in-memory collection of labeled arrays.
///
/// Collection coordinates are shared with every member whose dimensions include all of the coordinate's dimensions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollection {
    members: Vec<(String, InMemoryArray)>,
    coords: Vec<(String, InMemoryArray)>,
    attrs: Map<String, Value>,
}

fn shares_dims(array: &InMemoryArray, coord: &InMemoryArray) -> bool {
    coord.dims.iter().all(|d| array.dims.contains(d))
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member, which takes `name` as its name.
    pub fn with_member(mut self, name: impl Into<String>, array: InMemoryArray) -> Self {
        let name = name.into();
        let mut array = array.with_name(name.clone());
        for (coord_name, coord) in &self.coords {
            if !array.has_coord(coord_name) && shares_dims(&array, coord) {
                array = array.with_coord(coord_name.clone(), coord.clone());
            }
        }
        match self.members.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = array,
            None => self.members.push((name, array)),
        }
        self
    }

    /// Add or replace a coordinate, which takes `name` as its name.
    pub fn with_coord(mut self, name: impl Into<String>, coord: InMemoryArray) -> Self {
        let name = name.into();
        let coord = coord.with_name(name.clone());
        for (_, member) in &mut self.members {
            if shares_dims(member, &coord) {
                member.coords.retain(|(n, _)| *n != name);
                member.coords.push((name.clone(), coord.clone()));
            }
        }
        match self.coords.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = coord,
            None => self.coords.push((name, coord)),
        }
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Remove a member, if present.
    pub fn without_member(mut self, name: &str) -> Self {
        self.members.retain(|(n, _)| n != name);
        self
    }
}

impl LabeledCollection for InMemoryCollection {
    fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn member(&self, name: &str) -> Option<&dyn LabeledArray> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a as &dyn LabeledArray)
    }

    fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    fn coord_names(&self) -> Vec<&str> {
        self.coords.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn coord(&self, name: &str) -> Option<&dyn LabeledArray> {
        self.coords
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c as &dyn LabeledArray)
    }
}
