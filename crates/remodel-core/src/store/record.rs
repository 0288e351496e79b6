//! Record type for stored entity rows.

use crate::catalog::AttrValue;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// A stored entity row: named attribute values plus write metadata.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Attribute values, keyed by attribute name.
    pub attrs: Vec<(String, AttrValue)>,

    /// Creation timestamp in microseconds since Unix epoch.
    pub created_at: u64,
}

impl StoredRecord {
    /// Create a new record with the current timestamp.
    pub fn new(attrs: Vec<(String, AttrValue)>) -> Self {
        Self {
            attrs,
            created_at: super::current_timestamp(),
        }
    }

    /// Create a record with a specific timestamp.
    pub fn with_timestamp(attrs: Vec<(String, AttrValue)>, created_at: u64) -> Self {
        Self { attrs, created_at }
    }

    /// Get an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value)
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let record = StoredRecord::new(vec![
            ("id".to_string(), AttrValue::Uuid([7u8; 16])),
            ("name".to_string(), AttrValue::String("Alice".to_string())),
        ]);

        let bytes = record.to_bytes().unwrap();
        let decoded = StoredRecord::from_bytes(&bytes).unwrap();

        assert_eq!(record, decoded);
        assert_eq!(
            decoded.get("name"),
            Some(&AttrValue::String("Alice".to_string()))
        );
        assert!(decoded.get("missing").is_none());
    }
}
