//! Schema catalog - model history and old-model resolution.

use super::model::SchemaModel;
use crate::error::Error;
use crate::store::StoreHandle;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving schema models against a store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No store exists at the given location.
    #[error("no persistent store at {path}")]
    StoreMissing {
        /// The store location.
        path: PathBuf,
    },

    /// The store exists but could not be opened.
    #[error("store at {path} is unreadable: {source}")]
    StoreUnreadable {
        /// The store location.
        path: PathBuf,
        /// The underlying open failure.
        #[source]
        source: Error,
    },

    /// The store carries no schema metadata, or the metadata is undecodable.
    #[error("store at {path} has no usable schema metadata: {reason}")]
    MetadataUnusable {
        /// The store location.
        path: PathBuf,
        /// What was wrong with the metadata.
        reason: String,
    },

    /// The store's schema hash matches no known generation.
    #[error("store schema hash {hash} matches no known schema generation")]
    UnknownGeneration {
        /// The hash embedded in the store.
        hash: String,
    },

    /// The destination model failed structural validation.
    #[error("invalid schema model: {reason}")]
    InvalidModel {
        /// Validation failure description.
        reason: String,
    },
}

/// Resolves the old (source) schema model from a store's embedded
/// metadata, against the set of known schema generations.
///
/// The catalog owns the destination model and the model history the
/// caller supplies. All lookups are by version hash.
pub struct SchemaCatalog {
    destination: SchemaModel,
    history: Vec<SchemaModel>,
}

impl SchemaCatalog {
    /// Create a catalog for the given destination model.
    pub fn new(destination: SchemaModel) -> Self {
        Self {
            destination,
            history: Vec::new(),
        }
    }

    /// Replace the model history.
    pub fn with_history(mut self, history: Vec<SchemaModel>) -> Self {
        self.history = history;
        self
    }

    /// Add one known schema generation.
    pub fn push_generation(&mut self, model: SchemaModel) {
        self.history.push(model);
    }

    /// The destination (new) model.
    pub fn destination(&self) -> &SchemaModel {
        &self.destination
    }

    /// All known generations, oldest first, excluding the destination.
    pub fn history(&self) -> &[SchemaModel] {
        &self.history
    }

    /// Validate the destination model.
    pub fn validate_destination(&self) -> Result<(), CatalogError> {
        self.destination
            .validate()
            .map_err(|reason| CatalogError::InvalidModel { reason })
    }

    /// Resolve the schema model the store was written with.
    ///
    /// Reads the version hash embedded in the store metadata and looks it
    /// up in the model history (the destination model is also a known
    /// generation, so a store already at the destination schema resolves).
    pub fn resolve_old_model(&self, store: &StoreHandle) -> Result<&SchemaModel, CatalogError> {
        if !store.exists() {
            return Err(CatalogError::StoreMissing {
                path: store.path().to_path_buf(),
            });
        }

        store.open().map_err(|source| CatalogError::StoreUnreadable {
            path: store.path().to_path_buf(),
            source,
        })?;

        let hash = match store.read_schema_hash() {
            Ok(Some(hash)) => hash,
            Ok(None) => {
                return Err(CatalogError::MetadataUnusable {
                    path: store.path().to_path_buf(),
                    reason: "no schema hash recorded".to_string(),
                })
            }
            Err(e) => {
                return Err(CatalogError::MetadataUnusable {
                    path: store.path().to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        self.history
            .iter()
            .chain(std::iter::once(&self.destination))
            .find(|m| m.version_hash() == hash)
            .ok_or(CatalogError::UnknownGeneration { hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDef, EntityDef, ScalarType};
    use crate::store::StoreEngineKind;

    fn model_v1() -> SchemaModel {
        SchemaModel::new(1).with_entity(
            EntityDef::new("User", "id")
                .with_attribute(AttributeDef::new("id", ScalarType::Uuid))
                .with_attribute(AttributeDef::new("name", ScalarType::String)),
        )
    }

    fn model_v2() -> SchemaModel {
        SchemaModel::new(2).with_entity(
            EntityDef::new("User", "id")
                .with_attribute(AttributeDef::new("id", ScalarType::Uuid))
                .with_attribute(AttributeDef::new("name", ScalarType::String))
                .with_attribute(AttributeDef::optional("email", ScalarType::String)),
        )
    }

    #[test]
    fn test_resolve_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::new(dir.path().join("absent.db"), StoreEngineKind::Sled);
        let catalog = SchemaCatalog::new(model_v2()).with_history(vec![model_v1()]);

        assert!(matches!(
            catalog.resolve_old_model(&store),
            Err(CatalogError::StoreMissing { .. })
        ));
    }

    #[test]
    fn test_resolve_known_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::new(dir.path().join("live.db"), StoreEngineKind::Sled);
        store.write_schema_model(&model_v1()).unwrap();

        let catalog = SchemaCatalog::new(model_v2()).with_history(vec![model_v1()]);
        let old = catalog.resolve_old_model(&store).unwrap();

        assert!(old.is_same_model(&model_v1()));
    }

    #[test]
    fn test_resolve_destination_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::new(dir.path().join("live.db"), StoreEngineKind::Sled);
        store.write_schema_model(&model_v2()).unwrap();

        let catalog = SchemaCatalog::new(model_v2()).with_history(vec![model_v1()]);
        let old = catalog.resolve_old_model(&store).unwrap();

        assert!(old.is_same_model(&model_v2()));
    }

    #[test]
    fn test_resolve_unknown_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::new(dir.path().join("live.db"), StoreEngineKind::Sled);
        store.write_schema_model(&model_v1()).unwrap();

        // History does not include v1.
        let catalog = SchemaCatalog::new(model_v2());

        assert!(matches!(
            catalog.resolve_old_model(&store),
            Err(CatalogError::UnknownGeneration { .. })
        ));
    }

    #[test]
    fn test_resolve_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::new(dir.path().join("live.db"), StoreEngineKind::Sled);
        // Create the store directory without writing schema metadata.
        store.open().unwrap();
        store.flush().unwrap();

        let catalog = SchemaCatalog::new(model_v2()).with_history(vec![model_v1()]);

        assert!(matches!(
            catalog.resolve_old_model(&store),
            Err(CatalogError::MetadataUnusable { .. })
        ));
    }

    #[test]
    fn test_validate_destination() {
        let catalog = SchemaCatalog::new(SchemaModel::new(1));
        assert!(matches!(
            catalog.validate_destination(),
            Err(CatalogError::InvalidModel { .. })
        ));

        let catalog = SchemaCatalog::new(model_v1());
        assert!(catalog.validate_destination().is_ok());
    }
}
