//! Labeled arrays and collections read from Zarr hierarchies.
//!
//! Only metadata is read. Dimension names come from `dimension_names` (V3)
//! or the `_ARRAY_DIMENSIONS` attribute (V2). Within a group, an array named
//! after a dimension, or listed in a `coordinates` attribute, is a coordinate
//! rather than a member.

use bytes::Buf;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use zarrs::{
    metadata::{
        ArrayMetadata, GroupMetadata, NodeMetadata,
        v2::{ArrayMetadataV2, GroupMetadataV2},
        v3::NodeMetadataV3,
    },
    storage::{ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey, StorePrefix},
};

use crate::{
    LabeledArray, LabeledCollection,
    component::{ArrayType, DType},
    labeled::DimChunks,
};

mod metadata;
use metadata::LabeledMetadata;
pub use metadata::{ARRAY_DIMENSIONS_ATTR, COORDINATES_ATTR};

const ZARR_JSON: &str = "zarr.json";
const ZARRAY: &str = ".zarray";
const ZATTRS: &str = ".zattrs";
const ZGROUP: &str = ".zgroup";

/// Key of a metadata object within the node at `path`.
fn node_key(path: &str, file: &str) -> crate::Result<StoreKey> {
    let path = path.trim_matches('/');
    let key = if path.is_empty() {
        file.to_string()
    } else {
        format!("{path}/{file}")
    };
    Ok(StoreKey::new(key).map_err(StorageError::from)?)
}

fn node_prefix(path: &str) -> crate::Result<StorePrefix> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        Ok(StorePrefix::root())
    } else {
        Ok(StorePrefix::new(format!("{path}/")).map_err(StorageError::from)?)
    }
}

/// Final component of a node path; `None` for the root.
fn node_name(path: &str) -> Option<String> {
    path.trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn read_json<T, S>(storage: &S, key: &StoreKey) -> crate::Result<Option<T>>
where
    T: DeserializeOwned,
    S: ReadableStorageTraits + ?Sized,
{
    let Some(bytes) = storage.get(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_reader(bytes.reader()).map_err(|e| {
        StorageError::InvalidMetadata(key.clone(), format!("could not parse Zarr metadata: {e}"))
    })?;
    Ok(Some(value))
}

/// Read the metadata of the node at `path`, trying Zarr V3 before V2.
///
/// V2 attributes are merged from `.zattrs`.
/// Returns `None` if there is no node at `path`.
pub fn read_node_metadata<S>(storage: &S, path: &str) -> crate::Result<Option<NodeMetadata>>
where
    S: ReadableStorageTraits + ?Sized,
{
    if let Some(metadata) = read_json::<NodeMetadataV3, _>(storage, &node_key(path, ZARR_JSON)?)? {
        return Ok(Some(match metadata {
            NodeMetadataV3::Array(m) => NodeMetadata::Array(ArrayMetadata::V3(m)),
            NodeMetadataV3::Group(m) => NodeMetadata::Group(GroupMetadata::V3(m)),
        }));
    }
    let attributes_key = node_key(path, ZATTRS)?;
    if let Some(mut metadata) = read_json::<ArrayMetadataV2, _>(storage, &node_key(path, ZARRAY)?)? {
        if let Some(attributes) = read_json(storage, &attributes_key)? {
            metadata.attributes = attributes;
        }
        return Ok(Some(NodeMetadata::Array(ArrayMetadata::V2(metadata))));
    }
    if let Some(mut metadata) = read_json::<GroupMetadataV2, _>(storage, &node_key(path, ZGROUP)?)? {
        if let Some(attributes) = read_json(storage, &attributes_key)? {
            metadata.attributes = attributes;
        }
        return Ok(Some(NodeMetadata::Group(GroupMetadata::V2(metadata))));
    }
    Ok(None)
}

fn missing_node(path: &str) -> crate::Error {
    crate::Error::general(format!("no Zarr metadata found at {path:?}"))
}

/// Names listed in a `coordinates` attribute, which is removed.
fn take_coordinates(attrs: &mut Map<String, Value>) -> Vec<String> {
    let names = match attrs.get(COORDINATES_ATTR) {
        Some(Value::String(s)) => s.split_whitespace().map(String::from).collect::<Vec<_>>(),
        _ => return Vec::new(),
    };
    attrs.remove(COORDINATES_ATTR);
    names
}

/// The metadata of a Zarr array, as a labeled array.
#[derive(Debug, Clone)]
pub struct ZarrArray {
    name: Option<String>,
    metadata: ArrayMetadata,
    labeled: LabeledMetadata,
    coords: Vec<(String, ZarrArray)>,
}

impl ZarrArray {
    /// Build from `zarrs` array metadata of either version.
    ///
    /// # Errors
    /// If the chunk grid is unsupported or inconsistent with the shape,
    /// or the dimension names do not match the shape.
    pub fn from_metadata(
        name: Option<String>,
        metadata: impl Into<ArrayMetadata>,
    ) -> crate::Result<Self> {
        let metadata = metadata.into();
        let labeled = LabeledMetadata::try_from(&metadata)?;
        Ok(Self {
            name,
            metadata,
            labeled,
            coords: Vec::new(),
        })
    }

    /// Open the array at `path`, named after its final path component.
    ///
    /// Coordinates are only discovered when opened through [`ZarrGroup`].
    pub fn open<S>(storage: &S, path: &str) -> crate::Result<Self>
    where
        S: ReadableStorageTraits + ?Sized,
    {
        match read_node_metadata(storage, path)? {
            Some(NodeMetadata::Array(metadata)) => {
                log::debug!("opened Zarr array at {path:?}");
                Self::from_metadata(node_name(path), metadata)
            }
            Some(NodeMetadata::Group(_)) => Err(crate::Error::general(format!(
                "{path:?} is a group, not an array"
            ))),
            None => Err(missing_node(path)),
        }
    }

    pub fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }
}

impl LabeledArray for ZarrArray {
    fn dtype(&self) -> &DType {
        &self.labeled.dtype
    }

    fn dims(&self) -> &[String] {
        &self.labeled.dims
    }

    fn shape(&self) -> &[u64] {
        &self.labeled.shape
    }

    fn chunks(&self) -> Option<&[DimChunks]> {
        Some(&self.labeled.chunks)
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn attrs(&self) -> &Map<String, Value> {
        &self.labeled.attributes
    }

    fn array_type(&self) -> ArrayType {
        ArrayType::of::<Self>()
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

/// The arrays of a Zarr group, as a labeled collection.
///
/// Subgroups are not traversed.
#[derive(Debug, Clone, Default)]
pub struct ZarrGroup {
    members: Vec<(String, ZarrArray)>,
    coords: Vec<(String, ZarrArray)>,
    attrs: Map<String, Value>,
}

impl ZarrGroup {
    /// Open the group at `path` and read the metadata of its child arrays.
    ///
    /// Child prefixes without Zarr metadata are skipped.
    pub fn open<S>(storage: &S, path: &str) -> crate::Result<Self>
    where
        S: ReadableStorageTraits + ListableStorageTraits + ?Sized,
    {
        let attrs = match read_node_metadata(storage, path)? {
            Some(NodeMetadata::Group(GroupMetadata::V3(group))) => group.attributes,
            Some(NodeMetadata::Group(GroupMetadata::V2(group))) => group.attributes,
            Some(NodeMetadata::Array(_)) => {
                return Err(crate::Error::general(format!(
                    "{path:?} is an array, not a group"
                )));
            }
            None => return Err(missing_node(path)),
        };
        let mut arrays = Vec::new();
        for child in storage.list_dir(&node_prefix(path)?)?.prefixes() {
            let child_path = child.as_str().trim_end_matches('/');
            let Some(name) = node_name(child_path) else {
                continue;
            };
            match read_node_metadata(storage, child_path)? {
                Some(NodeMetadata::Array(metadata)) => arrays.push((name, metadata)),
                Some(NodeMetadata::Group(_)) => log::debug!("skipping subgroup {child_path:?}"),
                None => log::debug!("skipping {child_path:?}: not a Zarr node"),
            }
        }
        let group = Self::from_arrays(arrays, attrs)?;
        log::debug!(
            "opened Zarr group at {path:?} with {} members and {} coordinates",
            group.members.len(),
            group.coords.len()
        );
        Ok(group)
    }

    /// Split arrays into members and coordinates, and attach coordinates to the arrays they label.
    ///
    /// A coordinate labels an array if all of its dimensions are the array's,
    /// or if the array lists it in its `coordinates` attribute.
    ///
    /// # Errors
    /// If any array's metadata cannot be labeled (see [`ZarrArray::from_metadata`]).
    pub fn from_arrays(
        arrays: Vec<(String, ArrayMetadata)>,
        mut attrs: Map<String, Value>,
    ) -> crate::Result<Self> {
        let mut bases = arrays
            .into_iter()
            .map(|(name, m)| ZarrArray::from_metadata(Some(name.clone()), m).map(|a| (name, a)))
            .collect::<crate::Result<Vec<_>>>()?;
        bases.sort_by(|a, b| a.0.cmp(&b.0));
        let listed: Vec<Vec<String>> = bases
            .iter_mut()
            .map(|(_, a)| take_coordinates(&mut a.labeled.attributes))
            .collect();
        let group_listed = take_coordinates(&mut attrs);
        let is_coord: Vec<bool> = bases
            .iter()
            .map(|(name, _)| {
                bases.iter().any(|(_, a)| a.dims().contains(name))
                    || group_listed.contains(name)
                    || listed.iter().flatten().any(|n| n == name)
            })
            .collect();

        let attached: Vec<Vec<(String, ZarrArray)>> = bases
            .iter()
            .zip(&listed)
            .map(|((name, array), listed)| {
                bases
                    .iter()
                    .zip(&is_coord)
                    .filter(|((coord_name, coord), flag)| {
                        **flag
                            && coord_name != name
                            && (listed.contains(coord_name)
                                || coord.dims().iter().all(|d| array.dims().contains(d)))
                    })
                    .map(|((coord_name, coord), _)| (coord_name.clone(), coord.clone()))
                    .collect()
            })
            .collect();

        let mut group = Self {
            attrs,
            ..Default::default()
        };
        for (((name, mut array), coords), is_coord) in bases.into_iter().zip(attached).zip(is_coord)
        {
            array.coords = coords;
            if is_coord {
                group.coords.push((name, array));
            } else {
                group.members.push((name, array));
            }
        }
        Ok(group)
    }

    /// Look up a member or coordinate array by name.
    pub fn array(&self, name: &str) -> Option<&ZarrArray> {
        self.members
            .iter()
            .chain(&self.coords)
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }
}

impl LabeledCollection for ZarrGroup {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_names() {
        assert_eq!(node_key("/", ZARR_JSON).unwrap().as_str(), "zarr.json");
        assert_eq!(node_key("/a/b", ZARRAY).unwrap().as_str(), "a/b/.zarray");
        assert_eq!(node_prefix("/a/").unwrap().as_str(), "a/");
        assert_eq!(node_name("/a/b"), Some("b".to_string()));
        assert_eq!(node_name("/"), None);
    }

    #[test]
    fn coordinates_attr() {
        let mut attrs = Map::new();
        attrs.insert(COORDINATES_ATTR.into(), "lat lon".into());
        attrs.insert("units".into(), "K".into());
        assert_eq!(take_coordinates(&mut attrs), ["lat", "lon"]);
        assert!(!attrs.contains_key(COORDINATES_ATTR));
        assert_eq!(take_coordinates(&mut attrs), Vec::<String>::new());
    }
}
