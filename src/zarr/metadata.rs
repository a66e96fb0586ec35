//! The labeled view of `zarrs` array metadata.

use serde_json::{Map, Value};
use zarrs::{
    metadata::{
        ArrayMetadata, DimensionName, v2::DataTypeMetadataV2, v3::MetadataV3,
    },
    metadata_ext::chunk_grid::{
        rectangular::{RectangularChunkGridConfiguration, RectangularChunkGridDimensionConfiguration},
        regular::RegularChunkGridConfiguration,
    },
};

use crate::{
    component::DType,
    labeled::{Chunks, DimChunks, regular_chunks},
};

/// Attribute holding V2 dimension names, as written by xarray.
pub const ARRAY_DIMENSIONS_ATTR: &str = "_ARRAY_DIMENSIONS";

/// Attribute listing non-index coordinates, space-separated.
pub const COORDINATES_ATTR: &str = "coordinates";

/// Array metadata common to both Zarr versions.
#[derive(Debug, Clone)]
pub(crate) struct LabeledMetadata {
    pub dtype: DType,
    pub dims: Vec<String>,
    pub shape: Vec<u64>,
    pub chunks: Chunks,
    pub attributes: Map<String, Value>,
}

fn convert_data_type_v2(data_type: &DataTypeMetadataV2) -> DType {
    match data_type {
        DataTypeMetadataV2::Simple(s) => DType::parse_or_other(s),
        structured => DType::Other(structured.to_string()),
    }
}

/// Unnamed dimensions are called `dim_{i}`.
fn convert_dimension_names(
    names: Option<Vec<DimensionName>>,
    ndim: usize,
) -> crate::Result<Vec<String>> {
    let Some(names) = names else {
        return Ok((0..ndim).map(|i| format!("dim_{i}")).collect());
    };
    if names.len() != ndim {
        return Err(crate::Error::general(format!(
            "{} dimension names for {ndim} dimensions",
            names.len()
        )));
    }
    Ok(names
        .into_iter()
        .enumerate()
        .map(|(i, n)| n.unwrap_or_else(|| format!("dim_{i}")))
        .collect())
}

fn convert_chunk_grid(chunk_grid: &MetadataV3, shape: &[u64]) -> crate::Result<Chunks> {
    let invalid = |e: std::sync::Arc<serde_json::Error>| {
        crate::Error::general(format!("invalid {} chunk grid: {e}", chunk_grid.name()))
    };
    match chunk_grid.name() {
        "regular" | "regular_bounded" | "zarrs.regular_bounded" => {
            let config: RegularChunkGridConfiguration =
                chunk_grid.to_typed_configuration().map_err(invalid)?;
            let chunk_shape: Vec<u64> = config.chunk_shape.iter().map(|c| c.get()).collect();
            regular_chunks(shape, &chunk_shape)
        }
        "rectangular" => {
            let config: RectangularChunkGridConfiguration =
                chunk_grid.to_typed_configuration().map_err(invalid)?;
            if config.chunk_shape.len() != shape.len() {
                return Err(crate::Error::general(format!(
                    "rectangular chunk grid has {} dimensions, array has {}",
                    config.chunk_shape.len(),
                    shape.len()
                )));
            }
            config
                .chunk_shape
                .into_iter()
                .zip(shape)
                .map(|(dim, &extent)| match dim {
                    RectangularChunkGridDimensionConfiguration::Fixed(size) => {
                        DimChunks::regular(extent, size.get())
                    }
                    RectangularChunkGridDimensionConfiguration::Varying(sizes) => {
                        DimChunks::varying(sizes.iter().map(|s| s.get()).collect(), extent)
                    }
                })
                .collect()
        }
        name => Err(crate::Error::general(format!(
            "unsupported chunk grid: {name}"
        ))),
    }
}

impl TryFrom<&ArrayMetadata> for LabeledMetadata {
    type Error = crate::Error;

    fn try_from(value: &ArrayMetadata) -> Result<Self, Self::Error> {
        match value {
            ArrayMetadata::V3(m) => Ok(Self {
                dtype: DType::parse_or_other(m.data_type.name()),
                dims: convert_dimension_names(m.dimension_names.clone(), m.shape.len())?,
                shape: m.shape.clone(),
                chunks: convert_chunk_grid(&m.chunk_grid, &m.shape)?,
                attributes: m.attributes.clone(),
            }),
            ArrayMetadata::V2(m) => {
                let mut attributes = m.attributes.clone();
                let names = attributes
                    .remove(ARRAY_DIMENSIONS_ATTR)
                    .map(serde_json::from_value::<Vec<DimensionName>>)
                    .transpose()?;
                let chunk_shape: Vec<u64> = m.chunks.iter().map(|c| c.get()).collect();
                Ok(Self {
                    dtype: convert_data_type_v2(&m.dtype),
                    dims: convert_dimension_names(names, m.shape.len())?,
                    shape: m.shape.clone(),
                    chunks: regular_chunks(&m.shape, &chunk_shape)?,
                    attributes,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn v3(shape: &[u64], data_type: Value, chunk_grid: Value) -> ArrayMetadata {
        serde_json::from_value(json!({
            "zarr_format": 3,
            "node_type": "array",
            "shape": shape,
            "data_type": data_type,
            "chunk_grid": chunk_grid,
            "chunk_key_encoding": {"name": "default"},
            "fill_value": 0,
            "codecs": [{"name": "bytes"}],
            "attributes": {"units": "m"}
        }))
        .unwrap()
    }

    #[test]
    fn v3_array() {
        let mut meta = v3(
            &[10, 4],
            json!("float32"),
            json!({"name": "regular", "configuration": {"chunk_shape": [4, 4]}}),
        );
        if let ArrayMetadata::V3(m) = &mut meta {
            m.dimension_names = Some(vec![Some("x".into()), None]);
        }
        let labeled = LabeledMetadata::try_from(&meta).unwrap();
        assert_eq!(labeled.dtype, DType::Float32);
        assert_eq!(labeled.dims, ["x", "dim_1"]);
        assert_eq!(
            labeled.chunks,
            vec![
                DimChunks::Regular { size: 4, extent: 10 },
                DimChunks::Regular { size: 4, extent: 4 }
            ]
        );
        assert_eq!(labeled.attributes["units"], "m");
    }

    #[test]
    fn v3_rectangular_grid() {
        let meta = v3(
            &[4, 5],
            json!("uint8"),
            json!({"name": "rectangular", "configuration": {"chunk_shape": [[1, 3], 2]}}),
        );
        assert_eq!(
            LabeledMetadata::try_from(&meta).unwrap().chunks,
            vec![
                DimChunks::Varying(vec![1, 3]),
                DimChunks::Regular { size: 2, extent: 5 }
            ]
        );
    }

    #[test]
    fn rectangular_grid_must_cover_shape() {
        for chunk_shape in [json!([[1]]), json!([[4, 4, 4]]), json!([[5, 5], 2])] {
            let meta = v3(
                &[10],
                json!("uint8"),
                json!({"name": "rectangular", "configuration": {"chunk_shape": chunk_shape}}),
            );
            assert!(LabeledMetadata::try_from(&meta).is_err());
        }
    }

    #[test]
    fn unknown_chunk_grid() {
        let meta = v3(&[4], json!("uint8"), json!({"name": "hexagonal"}));
        let err = LabeledMetadata::try_from(&meta).unwrap_err();
        assert!(err.to_string().contains("hexagonal"));
    }

    #[test]
    fn v3_unknown_data_type() {
        let meta = v3(
            &[4],
            json!({"name": "numpy.datetime64", "configuration": {"unit": "s", "scale_factor": 1}}),
            json!({"name": "regular", "configuration": {"chunk_shape": [4]}}),
        );
        assert_eq!(
            LabeledMetadata::try_from(&meta).unwrap().dtype,
            DType::Other("numpy.datetime64".into())
        );
    }

    #[test]
    fn v2_array() {
        let meta: ArrayMetadata = serde_json::from_value(json!({
            "zarr_format": 2,
            "shape": [6],
            "chunks": [4],
            "dtype": "<i4",
            "compressor": null,
            "fill_value": 0,
            "order": "C",
            "filters": null,
            "attributes": {"_ARRAY_DIMENSIONS": ["time"], "title": "t"}
        }))
        .unwrap();
        let labeled = LabeledMetadata::try_from(&meta).unwrap();
        assert_eq!(labeled.dtype, DType::Int32);
        assert_eq!(labeled.dims, ["time"]);
        assert_eq!(labeled.chunks, vec![DimChunks::Regular { size: 4, extent: 6 }]);
        assert!(!labeled.attributes.contains_key(ARRAY_DIMENSIONS_ATTR));
        assert_eq!(labeled.attributes["title"], "t");
    }

    #[test]
    fn mismatched_dimension_names() {
        assert!(convert_dimension_names(Some(vec![Some("x".into())]), 2).is_err());
    }
}
