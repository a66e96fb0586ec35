use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::SchemaError;

/// A concrete array data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[rustfmt::skip]
pub enum DType {
    /// `bool`
    Bool,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint8`
    UInt8,
    /// `uint16`
    UInt16,
    /// `uint32`
    UInt32,
    /// `uint64`
    UInt64,
    /// `float16`
    Float16,
    /// `bfloat16`
    BFloat16,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `complex64`, two single-precision components.
    Complex64,
    /// `complex128`, two double-precision components.
    Complex128,
    /// Unicode strings.
    String,
    /// Raw byte strings.
    Bytes,
    /// Any other data type, by name. Only a member of [`DTypeKind::Generic`].
    Other(String),
}

impl DType {
    /// The canonical name, matching the Zarr V3 data type name where one exists.
    pub fn name(&self) -> &str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float16 => "float16",
            DType::BFloat16 => "bfloat16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
            DType::String => "string",
            DType::Bytes => "bytes",
            DType::Other(name) => name,
        }
    }

    /// Parse a data type, falling back to [`DType::Other`] for unrecognised names.
    pub fn parse_or_other(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| DType::Other(s.to_string()))
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strip a numpy byte order character, if the remainder looks like a type string.
fn strip_byte_order(s: &str) -> &str {
    match s.strip_prefix(['<', '>', '=', '|']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '?') => rest,
        _ => s,
    }
}

fn is_sized(s: &str, prefix: char) -> bool {
    s.strip_prefix(prefix)
        .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
}

/// Accepts Zarr V3 names, numpy type strings (`<i4`, `|b1`, `<U8`) and numpy aliases (`int`, `float`).
impl FromStr for DType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dtype = match strip_byte_order(s) {
            "bool" | "bool_" | "?" | "b1" => DType::Bool,
            "int8" | "i1" => DType::Int8,
            "int16" | "i2" => DType::Int16,
            "int32" | "i4" => DType::Int32,
            "int64" | "i8" | "int" => DType::Int64,
            "uint8" | "u1" => DType::UInt8,
            "uint16" | "u2" => DType::UInt16,
            "uint32" | "u4" => DType::UInt32,
            "uint64" | "u8" | "uint" => DType::UInt64,
            "float16" | "f2" | "half" => DType::Float16,
            "bfloat16" => DType::BFloat16,
            "float32" | "f4" | "single" => DType::Float32,
            "float64" | "f8" | "float" | "double" => DType::Float64,
            "complex64" | "c8" => DType::Complex64,
            "complex128" | "c16" | "complex" => DType::Complex128,
            "string" | "str" => DType::String,
            "bytes" | "binary" | "variable_length_bytes" => DType::Bytes,
            t if is_sized(t, 'U') => DType::String,
            t if is_sized(t, 'S') => DType::Bytes,
            _ => return Err(crate::Error::general(format!("unsupported data type: {s}"))),
        };
        Ok(dtype)
    }
}

/// A category of data types, following the numpy scalar type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeKind {
    /// Every data type.
    Generic,
    /// Booleans.
    Bool,
    /// Integers, floats and complex numbers.
    Number,
    /// Signed and unsigned integers.
    Integer,
    SignedInteger,
    UnsignedInteger,
    /// Real and complex floating point.
    Inexact,
    Floating,
    ComplexFloating,
    /// Strings and byte strings.
    Character,
}

impl DTypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            DTypeKind::Generic => "generic",
            DTypeKind::Bool => "bool",
            DTypeKind::Number => "number",
            DTypeKind::Integer => "integer",
            DTypeKind::SignedInteger => "signedinteger",
            DTypeKind::UnsignedInteger => "unsignedinteger",
            DTypeKind::Inexact => "inexact",
            DTypeKind::Floating => "floating",
            DTypeKind::ComplexFloating => "complexfloating",
            DTypeKind::Character => "character",
        }
    }

    /// Whether `dtype` belongs to this category.
    pub fn contains(&self, dtype: &DType) -> bool {
        use DType as D;
        let signed = matches!(dtype, D::Int8 | D::Int16 | D::Int32 | D::Int64);
        let unsigned = matches!(dtype, D::UInt8 | D::UInt16 | D::UInt32 | D::UInt64);
        let floating = matches!(dtype, D::Float16 | D::BFloat16 | D::Float32 | D::Float64);
        let complex = matches!(dtype, D::Complex64 | D::Complex128);
        match self {
            DTypeKind::Generic => true,
            DTypeKind::Bool => matches!(dtype, D::Bool),
            DTypeKind::Number => signed || unsigned || floating || complex,
            DTypeKind::Integer => signed || unsigned,
            DTypeKind::SignedInteger => signed,
            DTypeKind::UnsignedInteger => unsigned,
            DTypeKind::Inexact => floating || complex,
            DTypeKind::Floating => floating,
            DTypeKind::ComplexFloating => complex,
            DTypeKind::Character => matches!(dtype, D::String | D::Bytes),
        }
    }
}

impl fmt::Display for DTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DTypeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "generic" => DTypeKind::Generic,
            "bool" => DTypeKind::Bool,
            "number" => DTypeKind::Number,
            "integer" => DTypeKind::Integer,
            "signedinteger" => DTypeKind::SignedInteger,
            "unsignedinteger" => DTypeKind::UnsignedInteger,
            "inexact" => DTypeKind::Inexact,
            "floating" => DTypeKind::Floating,
            "complexfloating" => DTypeKind::ComplexFloating,
            "character" => DTypeKind::Character,
            _ => return Err(crate::Error::general(format!("unknown dtype kind: {s}"))),
        };
        Ok(kind)
    }
}

/// Data type schema.
///
/// Either a concrete [`DType`], which must match exactly,
/// or a [`DTypeKind`], which the actual data type must belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DTypeSchema {
    Exact(DType),
    Kind(DTypeKind),
}

impl DTypeSchema {
    pub fn validate(&self, dtype: &DType) -> Result<(), SchemaError> {
        let ok = match self {
            DTypeSchema::Exact(expected) => expected == dtype,
            DTypeSchema::Kind(kind) => kind.contains(dtype),
        };
        if ok {
            Ok(())
        } else {
            Err(SchemaError::DTypeMismatch {
                expected: self.to_string(),
                actual: dtype.clone(),
            })
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        super::to_json_value(self)
    }
}

impl fmt::Display for DTypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DTypeSchema::Exact(dtype) => dtype.fmt(f),
            DTypeSchema::Kind(kind) => kind.fmt(f),
        }
    }
}

impl Serialize for DTypeSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Category names take precedence, so `"bool"` is the [`DTypeKind::Bool`] category.
impl FromStr for DTypeSchema {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<DTypeKind>() {
            Ok(kind) => Ok(Self::Kind(kind)),
            Err(_) => s.parse::<DType>().map(Self::Exact),
        }
    }
}

impl From<DType> for DTypeSchema {
    fn from(value: DType) -> Self {
        Self::Exact(value)
    }
}

impl From<DTypeKind> for DTypeSchema {
    fn from(value: DTypeKind) -> Self {
        Self::Kind(value)
    }
}
