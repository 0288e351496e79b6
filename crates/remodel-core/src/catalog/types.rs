//! Scalar types and runtime attribute values.

use rkyv::Archive;

/// Scalar type of an attribute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp as microseconds since Unix epoch.
    Timestamp,
    /// UUID as 16 bytes.
    Uuid,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int64 => write!(f, "int64"),
            ScalarType::Float64 => write!(f, "float64"),
            ScalarType::String => write!(f, "string"),
            ScalarType::Bytes => write!(f, "bytes"),
            ScalarType::Timestamp => write!(f, "timestamp"),
            ScalarType::Uuid => write!(f, "uuid"),
        }
    }
}

/// A runtime attribute value stored in a record.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum AttrValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// UUID as 16 bytes.
    Uuid([u8; 16]),
}

impl AttrValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// The scalar type of this value, if it has one.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            AttrValue::Null => None,
            AttrValue::Bool(_) => Some(ScalarType::Bool),
            AttrValue::Int64(_) => Some(ScalarType::Int64),
            AttrValue::Float64(_) => Some(ScalarType::Float64),
            AttrValue::String(_) => Some(ScalarType::String),
            AttrValue::Bytes(_) => Some(ScalarType::Bytes),
            AttrValue::Timestamp(_) => Some(ScalarType::Timestamp),
            AttrValue::Uuid(_) => Some(ScalarType::Uuid),
        }
    }
}

/// Check whether values of `from` can be mechanically converted to `to`.
pub fn is_convertible(from: ScalarType, to: ScalarType) -> bool {
    use ScalarType::*;

    if from == to {
        return true;
    }

    matches!(
        (from, to),
        (Int64, Float64)
            | (Int64, Timestamp)
            | (Timestamp, Int64)
            | (Int64, String)
            | (Float64, String)
            | (Bool, String)
            | (Uuid, String)
            | (Timestamp, String)
    )
}

/// Convert a value to the target scalar type.
///
/// Null converts to null regardless of target. Returns `None` when the
/// conversion is not in the supported table.
pub fn convert(value: &AttrValue, to: ScalarType) -> Option<AttrValue> {
    if value.is_null() {
        return Some(AttrValue::Null);
    }

    if value.scalar_type() == Some(to) {
        return Some(value.clone());
    }

    match (value, to) {
        (AttrValue::Int64(v), ScalarType::Float64) => Some(AttrValue::Float64(*v as f64)),
        (AttrValue::Int64(v), ScalarType::Timestamp) => Some(AttrValue::Timestamp(*v)),
        (AttrValue::Timestamp(v), ScalarType::Int64) => Some(AttrValue::Int64(*v)),
        (AttrValue::Int64(v), ScalarType::String) => Some(AttrValue::String(v.to_string())),
        (AttrValue::Float64(v), ScalarType::String) => Some(AttrValue::String(v.to_string())),
        (AttrValue::Bool(v), ScalarType::String) => Some(AttrValue::String(v.to_string())),
        (AttrValue::Uuid(v), ScalarType::String) => Some(AttrValue::String(hex::encode(v))),
        (AttrValue::Timestamp(v), ScalarType::String) => Some(AttrValue::String(v.to_string())),
        _ => None,
    }
}
