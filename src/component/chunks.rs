use serde::{Serialize, Serializer};

use crate::{DimChunks, SchemaError};

/// The JSON rendering of [`ChunkSize::FullExtent`].
pub const FULL_EXTENT: i64 = -1;

/// The expected chunking along one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChunkSize {
    /// Any chunking.
    #[default]
    Any,
    /// A single chunk spanning the whole dimension.
    FullExtent,
    /// Regular chunks of this size; the final chunk may be smaller.
    Size(u64),
    /// Exactly these chunk extents.
    Explicit(Vec<u64>),
}

impl ChunkSize {
    fn matches(&self, actual: &DimChunks) -> bool {
        match (self, actual) {
            (ChunkSize::Any, _) => true,
            (ChunkSize::FullExtent, actual) => actual.num_chunks() == 1,
            (ChunkSize::Size(expected), DimChunks::Regular { size, extent }) => {
                if actual.num_chunks() == 1 {
                    extent <= expected
                } else {
                    size == expected
                }
            }
            (ChunkSize::Size(size), DimChunks::Varying(sizes)) => match sizes.split_last() {
                Some((last, init)) => init.iter().all(|c| c == size) && last <= size,
                None => true,
            },
            (ChunkSize::Explicit(chunks), DimChunks::Regular { size, .. }) => {
                match chunks.split_last() {
                    Some((last, init)) => {
                        init.len() as u64 + 1 == actual.num_chunks()
                            && init.iter().all(|c| c == size)
                            && *last == actual.last_chunk()
                    }
                    None => false,
                }
            }
            (ChunkSize::Explicit(chunks), DimChunks::Varying(sizes)) => chunks == sizes,
        }
    }

    fn describe(&self) -> String {
        match self {
            ChunkSize::Any => "any".to_string(),
            ChunkSize::FullExtent => "a single chunk".to_string(),
            ChunkSize::Size(size) => size.to_string(),
            ChunkSize::Explicit(chunks) => format!("{chunks:?}"),
        }
    }
}

impl Serialize for ChunkSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChunkSize::Any => serializer.serialize_none(),
            ChunkSize::FullExtent => serializer.serialize_i64(FULL_EXTENT),
            ChunkSize::Size(size) => serializer.serialize_u64(*size),
            ChunkSize::Explicit(chunks) => chunks.serialize(serializer),
        }
    }
}

impl From<u64> for ChunkSize {
    fn from(value: u64) -> Self {
        Self::Size(value)
    }
}

impl From<Option<u64>> for ChunkSize {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Any, Self::Size)
    }
}

impl From<Vec<u64>> for ChunkSize {
    fn from(value: Vec<u64>) -> Self {
        Self::Explicit(value)
    }
}

/// Chunks schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunksSchema {
    /// Whether the array must be chunked (`true`) or unchunked (`false`), regardless of chunk sizes.
    Chunked(bool),
    /// Expected chunking per dimension. Dimensions not listed are unconstrained.
    Dims(Vec<(String, ChunkSize)>),
}

impl ChunksSchema {
    pub fn dims<I, K, V>(dims: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ChunkSize>,
    {
        Self::Dims(
            dims.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Validate chunking.
    ///
    /// `chunks` holds the chunking along each of `dims`, or `None` for an unchunked array.
    pub fn validate(&self, chunks: Option<&[DimChunks]>, dims: &[String]) -> Result<(), SchemaError> {
        match (self, chunks) {
            (ChunksSchema::Chunked(true), None) | (ChunksSchema::Dims(_), None) => {
                Err(mismatch(None, "chunked", "unchunked"))
            }
            (ChunksSchema::Chunked(false), Some(_)) => Err(mismatch(None, "unchunked", "chunked")),
            (ChunksSchema::Chunked(_), _) => Ok(()),
            (ChunksSchema::Dims(expected), Some(chunks)) => {
                for (dim, size) in expected {
                    let actual = dims
                        .iter()
                        .position(|d| d == dim)
                        .and_then(|idx| chunks.get(idx));
                    let Some(actual) = actual else {
                        return Err(mismatch(Some(dim.as_str()), &size.describe(), "no such dimension"));
                    };
                    if !size.matches(actual) {
                        return Err(mismatch(
                            Some(dim.as_str()),
                            &size.describe(),
                            &actual.to_string(),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        super::to_json_value(self)
    }
}

fn mismatch(dim: Option<&str>, expected: &str, actual: &str) -> SchemaError {
    SchemaError::ChunksMismatch {
        dim: dim.map(str::to_string),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

impl Serialize for ChunksSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChunksSchema::Chunked(chunked) => serializer.serialize_bool(*chunked),
            ChunksSchema::Dims(dims) => serializer.collect_map(dims.iter().map(|(k, v)| (k, v))),
        }
    }
}

impl From<bool> for ChunksSchema {
    fn from(value: bool) -> Self {
        Self::Chunked(value)
    }
}

impl<K: Into<String>, V: Into<ChunkSize>, const N: usize> From<[(K, V); N]> for ChunksSchema {
    fn from(value: [(K, V); N]) -> Self {
        Self::dims(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn varying(sizes: &[u64]) -> DimChunks {
        DimChunks::Varying(sizes.to_vec())
    }

    fn regular(size: u64, extent: u64) -> DimChunks {
        DimChunks::Regular { size, extent }
    }

    #[test]
    fn chunked_flag() {
        ChunksSchema::from(true)
            .validate(Some(&[varying(&[1, 1])]), &dims(&["x"]))
            .unwrap();
        assert!(ChunksSchema::from(true).validate(None, &dims(&["x"])).is_err());
        ChunksSchema::from(false).validate(None, &dims(&["x"])).unwrap();
        let err = ChunksSchema::from(false)
            .validate(Some(&[regular(2, 4)]), &dims(&["x"]))
            .unwrap_err();
        assert!(err.to_string().contains("chunked != unchunked"));
    }

    #[test]
    fn regular_size() {
        let schema = ChunksSchema::from([("x", 2_u64)]);
        let x = dims(&["x"]);
        schema.validate(Some(&[varying(&[2, 2])]), &x).unwrap();
        schema.validate(Some(&[varying(&[2, 2, 1])]), &x).unwrap();
        schema.validate(Some(&[regular(2, 5)]), &x).unwrap();
        schema.validate(Some(&[regular(8, 1)]), &x).unwrap();
        assert!(schema.validate(Some(&[varying(&[2, 3, 2])]), &x).is_err());
        assert!(schema.validate(Some(&[varying(&[2, 2, 3])]), &x).is_err());
        assert!(schema.validate(Some(&[regular(3, 5)]), &x).is_err());
        let err = ChunksSchema::from([("x", 3_u64)])
            .validate(Some(&[regular(2, 4)]), &x)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::ChunksMismatch {
                dim: Some("x".into()),
                expected: "3".into(),
                actual: "2 chunks of 2 over 4".into(),
            }
        );
    }

    #[test]
    fn explicit_chunks() {
        let schema = ChunksSchema::from([("x", vec![1_u64, 2, 1])]);
        schema.validate(Some(&[varying(&[1, 2, 1])]), &dims(&["x"])).unwrap();
        let err = ChunksSchema::from([("x", vec![2_u64, 1])])
            .validate(Some(&[varying(&[2, 2])]), &dims(&["x"]))
            .unwrap_err();
        assert!(err.to_string().contains("[2, 1]"));
    }

    #[test]
    fn explicit_against_regular() {
        let x = dims(&["x"]);
        let grid = [regular(3, 10)];
        ChunksSchema::from([("x", vec![3_u64, 3, 3, 1])])
            .validate(Some(&grid), &x)
            .unwrap();
        for chunks in [vec![3_u64, 3, 4], vec![3, 3, 3, 3], vec![3, 3, 3, 1, 0], vec![]] {
            assert!(ChunksSchema::from([("x", chunks)]).validate(Some(&grid), &x).is_err());
        }
        ChunksSchema::from([("x", vec![0_u64])])
            .validate(Some(&[regular(4, 0)]), &x)
            .unwrap();
    }

    #[test]
    fn full_extent() {
        let schema = ChunksSchema::from([("x", ChunkSize::FullExtent)]);
        let x = dims(&["x"]);
        schema.validate(Some(&[varying(&[4])]), &x).unwrap();
        schema.validate(Some(&[regular(4, 4)]), &x).unwrap();
        schema.validate(Some(&[regular(8, 4)]), &x).unwrap();
        schema.validate(Some(&[regular(8, 0)]), &x).unwrap();
        assert!(schema.validate(Some(&[varying(&[2, 2])]), &x).is_err());
        assert!(schema.validate(Some(&[varying(&[1, 2, 1])]), &x).is_err());
        assert!(schema.validate(Some(&[regular(2, 4)]), &x).is_err());
    }

    #[test]
    fn huge_regular_dimension() {
        let x = dims(&["x"]);
        let grid = [regular(1, 1 << 62)];
        assert!(
            ChunksSchema::from([("x", ChunkSize::FullExtent)])
                .validate(Some(&grid), &x)
                .is_err()
        );
        ChunksSchema::from([("x", 1_u64)]).validate(Some(&grid), &x).unwrap();
        assert!(
            ChunksSchema::from([("x", vec![1_u64, 1])])
                .validate(Some(&grid), &x)
                .is_err()
        );
    }

    #[test]
    fn wildcard_and_full_extent() {
        let schema = ChunksSchema::from([("x", ChunkSize::Any), ("y", ChunkSize::FullExtent)]);
        let xy = dims(&["x", "y"]);
        schema
            .validate(Some(&[varying(&[3, 1, 2, 4]), regular(10, 10)]), &xy)
            .unwrap();
        let err = schema
            .validate(Some(&[regular(2, 4), varying(&[5, 5])]), &xy)
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ChunksMismatch { dim: Some(ref d), .. } if d == "y"
        ));
    }

    #[test]
    fn unchunked_or_missing_dim() {
        let schema = ChunksSchema::from([("x", vec![2_u64, 1])]);
        let err = schema.validate(None, &dims(&["x"])).unwrap_err();
        assert!(err.to_string().contains("chunked"));
        let err = ChunksSchema::from([("z", ChunkSize::Any)])
            .validate(Some(&[varying(&[4])]), &dims(&["x"]))
            .unwrap_err();
        assert!(err.to_string().contains("no such dimension"));
    }

    #[test]
    fn json() {
        let schema = ChunksSchema::from([
            ("x", ChunkSize::Size(2)),
            ("y", ChunkSize::FullExtent),
            ("z", ChunkSize::Any),
            ("t", ChunkSize::Explicit(vec![2, 2])),
        ]);
        assert_eq!(
            schema.to_json(),
            serde_json::json!({"x": 2, "y": -1, "z": null, "t": [2, 2]})
        );
        assert_eq!(ChunksSchema::from(true).to_json(), serde_json::json!(true));
    }
}
