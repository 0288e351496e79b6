//! Structural mapping inference.
//!
//! Diffs two schema models and, when every change is mechanically
//! mappable, builds the mapping model an explicit document would have
//! described.

use super::model::{AttributeMapping, EntityMapping, MappingModel};
use crate::catalog::{is_convertible, AttributeDef, ScalarType, SchemaModel};
use std::collections::HashSet;

/// A change to one attribute between two generations of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeChange {
    /// Attribute exists only in the new generation.
    Added(AttributeDef),
    /// Attribute exists only in the old generation.
    Removed(String),
    /// Attribute changed scalar type.
    TypeChanged {
        /// Attribute name.
        name: String,
        /// Old scalar type.
        from: ScalarType,
        /// New scalar type.
        to: ScalarType,
    },
}

/// Changes to one entity present in both generations.
#[derive(Debug, Clone)]
pub struct EntityDiff {
    /// Entity name.
    pub entity_name: String,
    /// Per-attribute changes.
    pub attribute_changes: Vec<AttributeChange>,
    /// Whether the identity attribute changed.
    pub identity_changed: bool,
}

/// Complete structural diff between two schema models.
#[derive(Debug, Clone)]
pub struct ModelDiff {
    /// Entities present only in the new model.
    pub added_entities: Vec<String>,
    /// Entities present only in the old model.
    pub removed_entities: Vec<String>,
    /// Entities present in both, with changes.
    pub changed_entities: Vec<EntityDiff>,
}

impl ModelDiff {
    /// Compute the diff between two schema models.
    pub fn compute(old: &SchemaModel, new: &SchemaModel) -> Self {
        let old_names: HashSet<&str> = old.entities.iter().map(|e| e.name.as_str()).collect();
        let new_names: HashSet<&str> = new.entities.iter().map(|e| e.name.as_str()).collect();

        let added_entities = new
            .entities
            .iter()
            .filter(|e| !old_names.contains(e.name.as_str()))
            .map(|e| e.name.clone())
            .collect();

        let removed_entities = old
            .entities
            .iter()
            .filter(|e| !new_names.contains(e.name.as_str()))
            .map(|e| e.name.clone())
            .collect();

        let mut changed_entities = Vec::new();
        for new_entity in &new.entities {
            let Some(old_entity) = old.entity(&new_entity.name) else {
                continue;
            };

            let mut attribute_changes = Vec::new();
            for attr in &new_entity.attributes {
                match old_entity.attribute(&attr.name) {
                    None => attribute_changes.push(AttributeChange::Added(attr.clone())),
                    Some(old_attr) if old_attr.scalar != attr.scalar => {
                        attribute_changes.push(AttributeChange::TypeChanged {
                            name: attr.name.clone(),
                            from: old_attr.scalar,
                            to: attr.scalar,
                        })
                    }
                    Some(_) => {}
                }
            }
            for old_attr in &old_entity.attributes {
                if new_entity.attribute(&old_attr.name).is_none() {
                    attribute_changes.push(AttributeChange::Removed(old_attr.name.clone()));
                }
            }

            let identity_changed = old_entity.identity_attribute != new_entity.identity_attribute;

            if !attribute_changes.is_empty() || identity_changed {
                changed_entities.push(EntityDiff {
                    entity_name: new_entity.name.clone(),
                    attribute_changes,
                    identity_changed,
                });
            }
        }

        Self {
            added_entities,
            removed_entities,
            changed_entities,
        }
    }

    /// Check if there are any changes.
    pub fn is_empty(&self) -> bool {
        self.added_entities.is_empty()
            && self.removed_entities.is_empty()
            && self.changed_entities.is_empty()
    }
}

/// Infer a mapping model from the structural diff of two schema models.
///
/// Returns `None` when any change defeats inference: an identity
/// attribute change, an incompatible scalar conversion, or a required
/// attribute added without a default.
pub fn infer_mapping(old: &SchemaModel, new: &SchemaModel) -> Option<MappingModel> {
    let diff = ModelDiff::compute(old, new);
    for changed in &diff.changed_entities {
        if changed.identity_changed {
            return None;
        }
    }

    let mut mapping = MappingModel::new("inferred", old, new);

    for entity in &new.entities {
        let Some(source) = old.entity(&entity.name) else {
            // Fresh entity: nothing to copy, rows start empty.
            mapping = mapping.with_entity_mapping(EntityMapping::new(
                format!("{}To{}", entity.name, entity.name),
                None,
                entity.name.clone(),
            ));
            continue;
        };

        let mut entity_mapping = EntityMapping::new(
            format!("{}To{}", source.name, entity.name),
            Some(source.name.clone()),
            entity.name.clone(),
        );

        for attr in &entity.attributes {
            let rule = match source.attribute(&attr.name) {
                Some(old_attr) if old_attr.scalar == attr.scalar => {
                    AttributeMapping::copy(&attr.name, &attr.name)
                }
                Some(old_attr) if is_convertible(old_attr.scalar, attr.scalar) => {
                    AttributeMapping::convert(&attr.name, &attr.name)
                }
                Some(_) => return None,
                None if attr.default.is_some() || attr.optional => {
                    AttributeMapping::defaulted(&attr.name)
                }
                None => return None,
            };
            entity_mapping = entity_mapping.with_attribute_mapping(rule);
        }

        mapping = mapping.with_entity_mapping(entity_mapping);
    }

    Some(mapping)
}

/// Whether automatic structural inference can migrate `old` to `new`.
pub fn can_infer(old: &SchemaModel, new: &SchemaModel) -> bool {
    infer_mapping(old, new).is_some()
}
