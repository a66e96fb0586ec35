//! Declarative schemas for labeled, chunked multidimensional arrays.
//!
//! An [`ArraySchema`] constrains the data type, dimension names, shape, name,
//! chunking, container type, attributes and coordinates of a [`LabeledArray`];
//! a [`CollectionSchema`] constrains the members of a [`LabeledCollection`].
//! Schemas are built once, validated against many instances, and exported as JSON.
//!
//! ```
//! use zarrs_schema::{ArraySchema, DType, DTypeKind, memory::InMemoryArray};
//!
//! let schema = ArraySchema::new()
//!     .with_dtype(DTypeKind::Integer)
//!     .with_name("foo")
//!     .with_shape([Some(4_u64), None]);
//! let array = InMemoryArray::new(DType::Int32, ["x", "y"], [4, 10])
//!     .unwrap()
//!     .with_name("foo");
//! assert!(schema.validate(&array).is_ok());
//! ```

mod array;
mod check;
mod collection;
pub mod component;
mod error;
mod labeled;
pub mod memory;
pub mod zarr;

pub use zarrs;

pub use array::{ArraySchema, CoordsSchema};
pub use check::{ArrayCheckFn, CollectionCheckFn};
pub use collection::CollectionSchema;
pub use component::{
    ArrayType, ArrayTypeSchema, AttrSchema, AttrType, AttrsSchema, ChunkSize, ChunksSchema,
    DType, DTypeKind, DTypeSchema, DimsSchema, FULL_EXTENT, NameSchema, ShapeSchema, Wildcard,
};
pub use error::{AttrMismatch, Error, MemberKind, Result, SchemaError, SequenceMismatch};
pub use labeled::{
    Chunks, DimChunks, LabeledArray, LabeledCollection, SingleArrayCollection, regular_chunks,
};
