//! Entity, attribute and relationship definitions.

use super::types::{AttrValue, ScalarType};
use rkyv::Archive;

/// An attribute definition within an entity.
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
pub struct AttributeDef {
    /// Attribute name (unique within the entity).
    pub name: String,
    /// Scalar type of the attribute.
    pub scalar: ScalarType,
    /// Whether the attribute may be null.
    pub optional: bool,
    /// Default value materialized when no source value exists.
    pub default: Option<AttrValue>,
}

impl AttributeDef {
    /// Create a new required attribute.
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            optional: false,
            default: None,
        }
    }

    /// Create an optional attribute.
    pub fn optional(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            optional: true,
            default: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: AttrValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// A relationship from one entity to another.
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
pub struct RelationshipDef {
    /// Relationship name (unique within the entity).
    pub name: String,
    /// Name of the target entity.
    pub target_entity: String,
    /// Whether this is a to-many relationship.
    pub to_many: bool,
}

impl RelationshipDef {
    /// Create a to-one relationship.
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_entity: target.into(),
            to_many: false,
        }
    }

    /// Create a to-many relationship.
    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_entity: target.into(),
            to_many: true,
        }
    }
}

/// An entity definition.
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
pub struct EntityDef {
    /// Entity name (unique within the model).
    pub name: String,
    /// Name of the identity attribute.
    pub identity_attribute: String,
    /// Attribute definitions, in declared order.
    pub attributes: Vec<AttributeDef>,
    /// Relationship definitions.
    pub relationships: Vec<RelationshipDef>,
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<String>, identity_attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_attribute: identity_attribute.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: RelationshipDef) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Get an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get the identity attribute definition.
    pub fn identity(&self) -> Option<&AttributeDef> {
        self.attribute(&self.identity_attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_builder() {
        let entity = EntityDef::new("User", "id")
            .with_attribute(AttributeDef::new("id", ScalarType::Uuid))
            .with_attribute(AttributeDef::optional("nickname", ScalarType::String))
            .with_relationship(RelationshipDef::to_many("posts", "Post"));

        assert_eq!(entity.attributes.len(), 2);
        assert_eq!(entity.relationships.len(), 1);
        assert!(entity.identity().is_some());
        assert!(entity.attribute("nickname").unwrap().optional);
    }

    #[test]
    fn test_attribute_default() {
        let attr = AttributeDef::new("age", ScalarType::Int64).with_default(AttrValue::Int64(0));
        assert_eq!(attr.default, Some(AttrValue::Int64(0)));
    }

    #[test]
    fn test_missing_identity() {
        let entity = EntityDef::new("User", "id");
        assert!(entity.identity().is_none());
    }
}
