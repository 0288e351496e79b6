//! Schema model - versioned snapshot of one schema generation.

use super::entity::EntityDef;
use crate::error::Error;
use rkyv::Archive;
use std::path::Path;

/// A versioned, immutable description of entities, attributes and
/// relationships for one schema generation.
///
/// Two models are "the same model" when their version hashes are equal;
/// the hash covers the full entity/attribute/relationship structure and
/// is insensitive to declaration order.
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
pub struct SchemaModel {
    /// Schema generation number (monotonically increasing).
    pub version: u64,
    /// Entity definitions.
    pub entities: Vec<EntityDef>,
}

impl SchemaModel {
    /// Create an empty schema model.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: Vec::new(),
        }
    }

    /// Add an entity to the model.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Get an entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// Compute the versioning hash of the model structure.
    ///
    /// Entities, attributes and relationships are fed to the hasher in
    /// name order so that declaration order never changes the hash.
    pub fn version_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();

        let mut entities: Vec<&EntityDef> = self.entities.iter().collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));

        for entity in entities {
            hasher.update(b"entity");
            hasher.update(entity.name.as_bytes());
            hasher.update(b"identity");
            hasher.update(entity.identity_attribute.as_bytes());

            let mut attributes: Vec<_> = entity.attributes.iter().collect();
            attributes.sort_by(|a, b| a.name.cmp(&b.name));
            for attr in attributes {
                hasher.update(b"attr");
                hasher.update(attr.name.as_bytes());
                hasher.update(attr.scalar.to_string().as_bytes());
                hasher.update(&[attr.optional as u8]);
                if let Some(default) = &attr.default {
                    hasher.update(format!("{default:?}").as_bytes());
                }
            }

            let mut relationships: Vec<_> = entity.relationships.iter().collect();
            relationships.sort_by(|a, b| a.name.cmp(&b.name));
            for rel in relationships {
                hasher.update(b"rel");
                hasher.update(rel.name.as_bytes());
                hasher.update(rel.target_entity.as_bytes());
                hasher.update(&[rel.to_many as u8]);
            }
        }

        hex::encode(hasher.finalize().as_bytes())
    }

    /// Check whether two models describe the same structure.
    pub fn is_same_model(&self, other: &SchemaModel) -> bool {
        self.version_hash() == other.version_hash()
    }

    /// Validate structural well-formedness.
    ///
    /// A model is valid when it has at least one entity, entity and
    /// attribute names are unique, every identity attribute exists, and
    /// every relationship target resolves to an entity in the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.entities.is_empty() {
            return Err("model declares no entities".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(format!("duplicate entity {}", entity.name));
            }

            if entity.identity().is_none() {
                return Err(format!(
                    "entity {} is missing its identity attribute {}",
                    entity.name, entity.identity_attribute
                ));
            }

            let mut attr_names = std::collections::HashSet::new();
            for attr in &entity.attributes {
                if !attr_names.insert(attr.name.as_str()) {
                    return Err(format!(
                        "duplicate attribute {}.{}",
                        entity.name, attr.name
                    ));
                }
            }

            for rel in &entity.relationships {
                if self.entity(&rel.target_entity).is_none() {
                    return Err(format!(
                        "relationship {}.{} targets unknown entity {}",
                        entity.name, rel.name, rel.target_entity
                    ));
                }
            }
        }

        Ok(())
    }

    /// Serialize the model to bytes for store-embedded metadata.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a model from store-embedded metadata bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Load a model from a JSON document on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the model as a JSON document.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDef, RelationshipDef, ScalarType};

    fn user_entity() -> EntityDef {
        EntityDef::new("User", "id")
            .with_attribute(AttributeDef::new("id", ScalarType::Uuid))
            .with_attribute(AttributeDef::new("name", ScalarType::String))
    }

    #[test]
    fn test_hash_is_order_insensitive() {
        let a = SchemaModel::new(1)
            .with_entity(user_entity())
            .with_entity(EntityDef::new("Post", "id").with_attribute(AttributeDef::new("id", ScalarType::Uuid)));
        let b = SchemaModel::new(1)
            .with_entity(EntityDef::new("Post", "id").with_attribute(AttributeDef::new("id", ScalarType::Uuid)))
            .with_entity(user_entity());

        assert_eq!(a.version_hash(), b.version_hash());
        assert!(a.is_same_model(&b));
    }

    #[test]
    fn test_hash_changes_with_structure() {
        let a = SchemaModel::new(1).with_entity(user_entity());
        let b = SchemaModel::new(2).with_entity(
            user_entity().with_attribute(AttributeDef::optional("email", ScalarType::String)),
        );

        assert_ne!(a.version_hash(), b.version_hash());
        assert!(!a.is_same_model(&b));
    }

    #[test]
    fn test_validate_ok() {
        let model = SchemaModel::new(1)
            .with_entity(user_entity().with_relationship(RelationshipDef::to_many("posts", "Post")))
            .with_entity(EntityDef::new("Post", "id").with_attribute(AttributeDef::new("id", ScalarType::Uuid)));

        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_model() {
        assert!(SchemaModel::new(1).validate().is_err());
    }

    #[test]
    fn test_validate_missing_identity() {
        let model = SchemaModel::new(1)
            .with_entity(EntityDef::new("User", "id").with_attribute(AttributeDef::new("name", ScalarType::String)));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_dangling_relationship() {
        let model = SchemaModel::new(1)
            .with_entity(user_entity().with_relationship(RelationshipDef::to_one("avatar", "Image")));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let model = SchemaModel::new(3).with_entity(user_entity());
        let bytes = model.to_bytes().unwrap();
        let decoded = SchemaModel::from_bytes(&bytes).unwrap();

        assert_eq!(model, decoded);
        assert_eq!(model.version_hash(), decoded.version_hash());
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v1.model.json");

        let model = SchemaModel::new(1).with_entity(user_entity());
        model.to_json_file(&path).unwrap();
        let loaded = SchemaModel::from_json_file(&path).unwrap();

        assert!(model.is_same_model(&loaded));
    }
}
