use bytes::Bytes;
use serde_json::{Value, json};
use zarrs::storage::{StorageError, StoreKey, WritableStorageTraits, store::MemoryStore};
use zarrs_schema::{
    ArraySchema, ArrayType, ChunkSize, CollectionSchema, DType, DTypeKind, DimChunks, Error,
    LabeledArray, LabeledCollection, SchemaError,
    zarr::{ZarrArray, ZarrGroup},
};

fn set_json(store: &MemoryStore, key: &str, value: Value) {
    env_logger::try_init().ok();
    store
        .set(
            &StoreKey::new(key).expect("valid key"),
            Bytes::from(value.to_string()),
        )
        .expect("write metadata");
}

fn v3_array(shape: &[u64], chunk_shape: &[u64], data_type: &str, dims: &[&str]) -> Value {
    json!({
        "zarr_format": 3,
        "node_type": "array",
        "shape": shape,
        "data_type": data_type,
        "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": chunk_shape}},
        "chunk_key_encoding": {"name": "default", "configuration": {"separator": "/"}},
        "fill_value": 0,
        "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
        "dimension_names": dims,
        "attributes": {}
    })
}

/// A V3 dataset with data variables `temperature(time, x)` and `mask(x)`
/// and coordinates `time`, `x` and `label(x)`.
fn v3_store() -> MemoryStore {
    let store = MemoryStore::new();
    set_json(
        &store,
        "zarr.json",
        json!({"zarr_format": 3, "node_type": "group", "attributes": {"title": "weather"}}),
    );
    let mut temperature = v3_array(&[10, 6], &[5, 6], "float32", &["time", "x"]);
    temperature["attributes"] = json!({"units": "K", "coordinates": "label"});
    set_json(&store, "temperature/zarr.json", temperature);
    set_json(&store, "mask/zarr.json", v3_array(&[6], &[4], "bool", &["x"]));
    set_json(&store, "time/zarr.json", v3_array(&[10], &[10], "int64", &["time"]));
    set_json(&store, "x/zarr.json", v3_array(&[6], &[6], "float64", &["x"]));
    set_json(&store, "label/zarr.json", v3_array(&[6], &[6], "string", &["x"]));
    set_json(
        &store,
        "nested/zarr.json",
        json!({"zarr_format": 3, "node_type": "group", "attributes": {}}),
    );
    store
}

/// The same layout as written by xarray to Zarr V2.
fn v2_store() -> MemoryStore {
    let store = MemoryStore::new();
    set_json(&store, ".zgroup", json!({"zarr_format": 2}));
    set_json(&store, ".zattrs", json!({"title": "weather"}));
    let v2_array = |shape: &[u64], chunks: &[u64], dtype: &str| {
        json!({
            "zarr_format": 2,
            "shape": shape,
            "chunks": chunks,
            "dtype": dtype,
            "compressor": null,
            "fill_value": 0,
            "filters": null,
            "order": "C"
        })
    };
    set_json(&store, "temperature/.zarray", v2_array(&[10, 6], &[5, 6], "<f4"));
    set_json(
        &store,
        "temperature/.zattrs",
        json!({"_ARRAY_DIMENSIONS": ["time", "x"], "units": "K", "coordinates": "label"}),
    );
    set_json(&store, "mask/.zarray", v2_array(&[6], &[4], "|b1"));
    set_json(&store, "mask/.zattrs", json!({"_ARRAY_DIMENSIONS": ["x"]}));
    set_json(&store, "time/.zarray", v2_array(&[10], &[10], "<i8"));
    set_json(&store, "time/.zattrs", json!({"_ARRAY_DIMENSIONS": ["time"]}));
    set_json(&store, "x/.zarray", v2_array(&[6], &[6], "<f8"));
    set_json(&store, "x/.zattrs", json!({"_ARRAY_DIMENSIONS": ["x"]}));
    set_json(&store, "label/.zarray", v2_array(&[6], &[6], "<U8"));
    set_json(&store, "label/.zattrs", json!({"_ARRAY_DIMENSIONS": ["x"]}));
    store
}

fn dataset_schema() -> CollectionSchema {
    CollectionSchema::default()
        .with_member(
            "temperature",
            ArraySchema::new()
                .with_dtype(DTypeKind::Floating)
                .with_dims(["time", "x"])
                .with_shape([None, Some(6_u64)])
                .with_chunks([("time", ChunkSize::Size(5)), ("x", ChunkSize::FullExtent)])
                .with_attrs([("units", "K")])
                .with_coords([
                    ("time", ArraySchema::new().with_dtype(DTypeKind::Integer)),
                    ("x", ArraySchema::new().with_dtype(DType::Float64)),
                    ("label", ArraySchema::new().with_dtype(DTypeKind::Character)),
                ])
                .with_array_type(ArrayType::of::<ZarrArray>()),
        )
        .with_member("mask", ArraySchema::new().with_dtype(DType::Bool))
        .allow_extra_members(false)
        .with_attrs([("title", "weather")])
        .with_coords([("time", ArraySchema::new().with_dims(["time"]))])
}

fn check_group(group: &ZarrGroup) {
    assert_eq!(group.member_names(), ["mask", "temperature"]);
    assert_eq!(group.coord_names(), ["label", "time", "x"]);
    assert_eq!(group.attrs()["title"], "weather");

    let temperature = group.member("temperature").expect("temperature");
    assert_eq!(temperature.name(), Some("temperature"));
    assert_eq!(temperature.dtype(), &DType::Float32);
    assert_eq!(temperature.dims(), ["time", "x"]);
    assert_eq!(temperature.shape(), [10, 6]);
    assert_eq!(
        temperature.chunks(),
        Some(
            &[
                DimChunks::Regular { size: 5, extent: 10 },
                DimChunks::Regular { size: 6, extent: 6 }
            ][..]
        )
    );
    assert_eq!(temperature.coord_names(), ["label", "time", "x"]);
    assert!(!temperature.attrs().contains_key("coordinates"));

    let mask = group.member("mask").expect("mask");
    assert_eq!(mask.chunks(), Some(&[DimChunks::Regular { size: 4, extent: 6 }][..]));
    assert_eq!(mask.coord_names(), ["label", "x"]);

    dataset_schema().validate(group).unwrap();
}

#[test]
fn read_v3_group() {
    let store = v3_store();
    let group = ZarrGroup::open(&store, "/").unwrap();
    check_group(&group);
    assert_eq!(
        group.array("label").map(|a| a.dtype().clone()),
        Some(DType::String)
    );
}

#[test]
fn read_v2_group() {
    let store = v2_store();
    let group = ZarrGroup::open(&store, "/").unwrap();
    check_group(&group);
    assert_eq!(
        group.array("label").map(|a| a.dtype().clone()),
        Some(DType::String)
    );
}

#[test]
fn schema_failures() {
    let store = v3_store();
    let group = ZarrGroup::open(&store, "/").unwrap();

    let schema = dataset_schema().with_member(
        "temperature",
        ArraySchema::new().with_chunks([("time", ChunkSize::FullExtent)]),
    );
    assert!(matches!(
        schema.validate(&group).unwrap_err(),
        SchemaError::ChunksMismatch { .. }
    ));

    let schema = dataset_schema().with_member("humidity", ArraySchema::new());
    assert!(matches!(
        schema.validate(&group).unwrap_err(),
        SchemaError::MissingMember { .. }
    ));

    let schema = CollectionSchema::default()
        .with_member("mask", ArraySchema::new())
        .allow_extra_members(false);
    assert!(matches!(
        schema.validate(&group).unwrap_err(),
        SchemaError::UnexpectedMember { .. }
    ));
}

#[test]
fn open_array() {
    let store = v3_store();
    let array = ZarrArray::open(&store, "/temperature").unwrap();
    assert_eq!(array.name(), Some("temperature"));
    assert!(array.coord_names().is_empty());
    assert_eq!(array.attrs()["coordinates"], "label");

    assert!(ZarrArray::open(&store, "/").is_err());
    assert!(ZarrArray::open(&store, "/missing").is_err());
    assert!(ZarrGroup::open(&store, "/mask").is_err());
}

#[test]
fn array_from_zarrs_metadata() {
    let metadata: zarrs::array::ArrayMetadataV3 =
        serde_json::from_value(v3_array(&[7, 3], &[2, 3], "uint16", &["y", "x"])).unwrap();
    let array = ZarrArray::from_metadata(Some("image".into()), metadata).unwrap();
    assert_eq!(array.dtype(), &DType::UInt16);
    assert_eq!(
        array.chunks(),
        Some(
            &[
                DimChunks::Regular { size: 2, extent: 7 },
                DimChunks::Regular { size: 3, extent: 3 }
            ][..]
        )
    );

    let schema = ArraySchema::new()
        .with_name("image")
        .with_dtype(DTypeKind::UnsignedInteger)
        .with_dims(["y", "x"])
        .with_chunks([("y", ChunkSize::Explicit(vec![2, 2, 2, 1])), ("x", ChunkSize::FullExtent)]);
    schema.validate(&array).unwrap();
}

#[test]
fn unparsable_child_fails_group() {
    let store = v3_store();
    set_json(
        &store,
        "broken/zarr.json",
        json!({"zarr_format": 3, "node_type": "array", "shape": "oops"}),
    );
    let err = ZarrGroup::open(&store, "/").unwrap_err();
    assert!(matches!(
        err,
        Error::Storage(StorageError::InvalidMetadata(ref key, _)) if key.as_str() == "broken/zarr.json"
    ));
}

#[test]
fn prefix_without_metadata_is_skipped() {
    let store = v3_store();
    store
        .set(&StoreKey::new("raw/c/0").unwrap(), Bytes::from_static(b"\x00\x01"))
        .unwrap();
    let group = ZarrGroup::open(&store, "/").unwrap();
    check_group(&group);
    assert!(group.array("raw").is_none());
}

#[test]
fn rectangular_chunks_must_cover_shape() {
    let store = v3_store();
    let mut wide = v3_array(&[10], &[10], "uint8", &["x"]);
    wide["chunk_grid"] = json!({"name": "rectangular", "configuration": {"chunk_shape": [[1]]}});
    set_json(&store, "wide/zarr.json", wide);
    assert!(ZarrArray::open(&store, "/wide").is_err());
    assert!(ZarrGroup::open(&store, "/").is_err());
}

#[test]
fn huge_dimension() {
    let store = MemoryStore::new();
    set_json(&store, "zarr.json", v3_array(&[1 << 62], &[1], "uint8", &["x"]));
    let array = ZarrArray::open(&store, "/").unwrap();
    let chunks = array.chunks().expect("chunked");
    assert_eq!(chunks[0].num_chunks(), 1 << 62);

    let err = ArraySchema::new()
        .with_chunks([("x", ChunkSize::FullExtent)])
        .validate(&array)
        .unwrap_err();
    assert!(matches!(err, SchemaError::ChunksMismatch { .. }));
    ArraySchema::new()
        .with_chunks([("x", 1_u64)])
        .validate(&array)
        .unwrap();
}
