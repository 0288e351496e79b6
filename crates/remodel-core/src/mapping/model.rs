//! Mapping models: declarative transforms between two schema generations.

use crate::catalog::SchemaModel;
use crate::error::Error;
use std::path::Path;

/// How one destination attribute obtains its value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AttributeTransform {
    /// Copy the named source attribute unchanged.
    Copy {
        /// Source attribute name.
        from: String,
    },
    /// Convert the named source attribute to the destination scalar type.
    Convert {
        /// Source attribute name.
        from: String,
    },
    /// Materialize the destination attribute's default (or null when the
    /// attribute is optional).
    Default,
}

/// Transform rule for a single destination attribute.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttributeMapping {
    /// Destination attribute name.
    pub attribute: String,
    /// Value transform.
    pub transform: AttributeTransform,
}

impl AttributeMapping {
    /// Copy `from` into `attribute`.
    pub fn copy(attribute: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            transform: AttributeTransform::Copy { from: from.into() },
        }
    }

    /// Convert `from` into `attribute`'s scalar type.
    pub fn convert(attribute: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            transform: AttributeTransform::Convert { from: from.into() },
        }
    }

    /// Fill `attribute` from its default.
    pub fn defaulted(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            transform: AttributeTransform::Default,
        }
    }
}

/// The transform unit for a single entity type.
///
/// Entity mappings are processed in the order the mapping model declares
/// them; the one currently being processed is published for observation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityMapping {
    /// Mapping name, e.g. `UserToUser`.
    pub name: String,
    /// Source entity, or `None` when the destination entity is new.
    pub source_entity: Option<String>,
    /// Destination entity name.
    pub destination_entity: String,
    /// Transform rules for the destination attributes.
    pub attribute_mappings: Vec<AttributeMapping>,
}

impl EntityMapping {
    /// Create an entity mapping.
    pub fn new(
        name: impl Into<String>,
        source_entity: Option<String>,
        destination_entity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_entity,
            destination_entity: destination_entity.into(),
            attribute_mappings: Vec::new(),
        }
    }

    /// Add an attribute mapping.
    pub fn with_attribute_mapping(mut self, mapping: AttributeMapping) -> Self {
        self.attribute_mappings.push(mapping);
        self
    }
}

/// A declarative transform from one schema model to another, addressed by
/// the version hashes of its endpoints.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MappingModel {
    /// Mapping model name.
    pub name: String,
    /// Version hash of the source schema model.
    pub source_hash: String,
    /// Version hash of the destination schema model.
    pub destination_hash: String,
    /// Ordered entity mappings.
    pub entity_mappings: Vec<EntityMapping>,
}

impl MappingModel {
    /// Create an empty mapping model between two schema models.
    pub fn new(
        name: impl Into<String>,
        source: &SchemaModel,
        destination: &SchemaModel,
    ) -> Self {
        Self {
            name: name.into(),
            source_hash: source.version_hash(),
            destination_hash: destination.version_hash(),
            entity_mappings: Vec::new(),
        }
    }

    /// Add an entity mapping.
    pub fn with_entity_mapping(mut self, mapping: EntityMapping) -> Self {
        self.entity_mappings.push(mapping);
        self
    }

    /// Whether this mapping applies to the given model pair.
    pub fn matches(&self, source: &SchemaModel, destination: &SchemaModel) -> bool {
        self.source_hash == source.version_hash()
            && self.destination_hash == destination.version_hash()
    }

    /// Number of entity mappings.
    pub fn len(&self) -> usize {
        self.entity_mappings.len()
    }

    /// Whether the mapping has no entity mappings.
    pub fn is_empty(&self) -> bool {
        self.entity_mappings.is_empty()
    }

    /// Load a mapping model from a JSON document on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the mapping model as a JSON document.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
