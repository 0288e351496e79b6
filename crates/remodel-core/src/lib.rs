//! remodel core - versioned migration of persistent stores.
//!
//! Classifies whether (and how) a store can migrate to a new schema
//! model, then executes one of two strategies: automatic inferred-mapping
//! migration, or specific-mapping migration with progress reporting and
//! cancellation. On success the migrated working copy atomically replaces
//! the live store, optionally preserving the old store under a backup
//! extension.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod error;
pub mod locate;
pub mod mapping;
pub mod migration;
pub mod store;

pub use catalog::{
    AttrValue, AttributeDef, CatalogError, EntityDef, RelationshipDef, ScalarType, SchemaCatalog,
    SchemaModel,
};
pub use error::Error;
pub use mapping::{
    AttributeMapping, AttributeTransform, EntityMapping, MappingError, MappingModel,
    MappingRegistry,
};
pub use migration::{
    ExecutorConfig, MigrationError, MigrationManager, MigrationOptions, MigrationPhase,
    MigrationPlanner, MigrationStatus, OptionsError, ERROR_DOMAIN,
};
pub use store::{StoreEngineKind, StoreHandle, StoredRecord};
