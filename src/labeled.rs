//! The labeled array data model validated by schemas.

use std::fmt;

use serde_json::{Map, Value};

use crate::component::{ArrayType, DType};

/// The chunks along one dimension of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimChunks {
    /// Chunks of `size` covering `extent`. The final chunk holds the remainder.
    /// An empty dimension, or a zero `size`, is a single chunk.
    Regular { size: u64, extent: u64 },
    /// Explicit chunk extents.
    Varying(Vec<u64>),
}

impl DimChunks {
    /// # Errors
    /// If `size` is zero.
    pub fn regular(extent: u64, size: u64) -> crate::Result<Self> {
        if size == 0 {
            return Err(crate::Error::general("zero chunk size"));
        }
        Ok(Self::Regular { size, extent })
    }

    /// # Errors
    /// If `sizes` is empty, holds a zero-sized chunk along a non-empty dimension,
    /// or does not sum to `extent`.
    pub fn varying(sizes: Vec<u64>, extent: u64) -> crate::Result<Self> {
        if sizes.is_empty() {
            return Err(crate::Error::general("no chunks given"));
        }
        if extent != 0 && sizes.contains(&0) {
            return Err(crate::Error::general(format!(
                "zero-sized chunk in {sizes:?}"
            )));
        }
        let total = sizes.iter().try_fold(0_u64, |acc, &s| acc.checked_add(s));
        if total != Some(extent) {
            return Err(crate::Error::general(format!(
                "chunks {sizes:?} do not cover extent {extent}"
            )));
        }
        Ok(Self::Varying(sizes))
    }

    /// Length of the dimension.
    pub fn extent(&self) -> u64 {
        match self {
            DimChunks::Regular { extent, .. } => *extent,
            DimChunks::Varying(sizes) => sizes.iter().sum(),
        }
    }

    pub fn num_chunks(&self) -> u64 {
        match self {
            DimChunks::Regular { size, extent } if extent <= size || *size == 0 => 1,
            DimChunks::Regular { size, extent } => extent.div_ceil(*size),
            DimChunks::Varying(sizes) => sizes.len() as u64,
        }
    }

    /// Extent of the final chunk.
    pub fn last_chunk(&self) -> u64 {
        match self {
            DimChunks::Regular { size, extent } if extent <= size || *size == 0 => *extent,
            DimChunks::Regular { size, extent } => match extent % size {
                0 => *size,
                rem => rem,
            },
            DimChunks::Varying(sizes) => sizes.last().copied().unwrap_or_default(),
        }
    }
}

impl fmt::Display for DimChunks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimChunks::Regular { size, extent } => {
                write!(f, "{} chunks of {size} over {extent}", self.num_chunks())
            }
            DimChunks::Varying(sizes) => write!(f, "{sizes:?}"),
        }
    }
}

/// Chunks along each dimension of an array.
pub type Chunks = Vec<DimChunks>;

/// A multidimensional array with named dimensions, attributes and coordinate variables.
pub trait LabeledArray: fmt::Debug {
    fn dtype(&self) -> &DType;

    /// Dimension names, one per axis.
    fn dims(&self) -> &[String];

    fn shape(&self) -> &[u64];

    /// Chunks along each dimension, or `None` if the array is not chunked.
    fn chunks(&self) -> Option<&[DimChunks]>;

    fn name(&self) -> Option<&str>;

    fn attrs(&self) -> &Map<String, Value>;

    /// The concrete container holding the array's data.
    fn array_type(&self) -> ArrayType;

    fn coord_names(&self) -> Vec<&str>;

    fn coord(&self, name: &str) -> Option<&dyn LabeledArray>;
}

/// A named collection of labeled arrays sharing dimensions.
pub trait LabeledCollection: fmt::Debug {
    fn member_names(&self) -> Vec<&str>;

    fn member(&self, name: &str) -> Option<&dyn LabeledArray>;

    fn attrs(&self) -> &Map<String, Value>;

    fn coord_names(&self) -> Vec<&str>;

    fn coord(&self, name: &str) -> Option<&dyn LabeledArray>;
}

/// A named array viewed as a collection with that array as its only member.
///
/// The array's coordinates and attributes are the collection's.
/// An unnamed array has no addressable member.
#[derive(Debug)]
pub struct SingleArrayCollection<'a> {
    array: &'a dyn LabeledArray,
}

impl<'a> SingleArrayCollection<'a> {
    pub fn new(array: &'a dyn LabeledArray) -> Self {
        Self { array }
    }
}

impl LabeledCollection for SingleArrayCollection<'_> {
    fn member_names(&self) -> Vec<&str> {
        self.array.name().into_iter().collect()
    }

    fn member(&self, name: &str) -> Option<&dyn LabeledArray> {
        (self.array.name() == Some(name)).then_some(self.array)
    }

    fn attrs(&self) -> &Map<String, Value> {
        self.array.attrs()
    }

    fn coord_names(&self) -> Vec<&str> {
        self.array.coord_names()
    }

    fn coord(&self, name: &str) -> Option<&dyn LabeledArray> {
        self.array.coord(name)
    }
}

/// Regular chunking of every dimension with the given chunk shape.
pub fn regular_chunks(shape: &[u64], chunk_shape: &[u64]) -> crate::Result<Chunks> {
    if shape.len() != chunk_shape.len() {
        return Err(crate::Error::general(format!(
            "chunk shape {chunk_shape:?} does not match array shape {shape:?}"
        )));
    }
    shape
        .iter()
        .zip(chunk_shape)
        .map(|(&extent, &size)| DimChunks::regular(extent, size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_chunks_with_remainder() {
        let chunks = regular_chunks(&[7, 4, 0], &[2, 4, 3]).unwrap();
        assert_eq!(
            chunks.iter().map(DimChunks::num_chunks).collect::<Vec<_>>(),
            [4, 1, 1]
        );
        assert_eq!(
            chunks.iter().map(DimChunks::last_chunk).collect::<Vec<_>>(),
            [1, 4, 0]
        );
    }

    #[test]
    fn regular_chunks_invalid() {
        assert!(regular_chunks(&[4], &[0]).is_err());
        assert!(regular_chunks(&[4, 4], &[2]).is_err());
    }

    #[test]
    fn huge_regular_extent() {
        let chunks = regular_chunks(&[1 << 62], &[1]).unwrap();
        assert_eq!(chunks[0].num_chunks(), 1 << 62);
        assert_eq!(chunks[0].last_chunk(), 1);
        assert_eq!(chunks[0].extent(), 1 << 62);
    }

    #[test]
    fn varying_must_cover_extent() {
        assert!(DimChunks::varying(vec![1, 2, 1], 4).is_ok());
        assert!(DimChunks::varying(vec![0], 0).is_ok());
        assert!(DimChunks::varying(vec![1], 10).is_err());
        assert!(DimChunks::varying(vec![2, 0, 2], 4).is_err());
        assert!(DimChunks::varying(vec![], 0).is_err());
        assert!(DimChunks::varying(vec![u64::MAX, 2], 1).is_err());
    }
}
