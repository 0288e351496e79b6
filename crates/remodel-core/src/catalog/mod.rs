//! Schema catalog: models, entities, attribute types, and resolution of
//! the schema generation a store was written with.

mod catalog;
mod entity;
mod model;
mod types;

pub use catalog::{CatalogError, SchemaCatalog};
pub use entity::{AttributeDef, EntityDef, RelationshipDef};
pub use model::SchemaModel;
pub use types::{convert, is_convertible, AttrValue, ScalarType};
