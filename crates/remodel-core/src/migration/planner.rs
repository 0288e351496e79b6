//! Migration status planning.
//!
//! Combines the schema catalog and the mapping registry into the
//! [`MigrationStatus`] classification that decides which execution paths
//! are legal.

use super::status::MigrationStatus;
use crate::catalog::{CatalogError, SchemaCatalog};
use crate::mapping::{can_infer, MappingRegistry};
use crate::store::StoreHandle;

/// Computes the migration status for one store/model pair.
///
/// The classification is recomputed from scratch on each call, has no
/// side effects, and always reflects the live target store, never a
/// transient working copy. It is safe to call at any time, including
/// while a migration is running.
pub struct MigrationPlanner<'a> {
    catalog: &'a SchemaCatalog,
    registry: &'a MappingRegistry,
    store: &'a StoreHandle,
}

impl<'a> MigrationPlanner<'a> {
    /// Create a planner over the given collaborators.
    pub fn new(
        catalog: &'a SchemaCatalog,
        registry: &'a MappingRegistry,
        store: &'a StoreHandle,
    ) -> Self {
        Self {
            catalog,
            registry,
            store,
        }
    }

    /// Classify the store/model pair. First match wins:
    ///
    /// 1. store missing or unreadable → `NoPersistentStore`
    /// 2. store metadata matches no known schema → `CorruptedStore`
    /// 3. destination model invalid → `NoManagedObjectModel`
    /// 4. old and new model are the same → `SameModel`
    /// 5. specific mapping and inference both available → `AnyMappingModel`
    /// 6. only inference available → `InferredMappingModel`
    /// 7. only a specific mapping available → `SpecificMappingModel`
    /// 8. otherwise → `NoMappingModel`
    pub fn status(&self) -> MigrationStatus {
        let old = match self.catalog.resolve_old_model(self.store) {
            Ok(old) => old,
            Err(CatalogError::StoreMissing { .. } | CatalogError::StoreUnreadable { .. }) => {
                return MigrationStatus::NoPersistentStore;
            }
            Err(
                CatalogError::MetadataUnusable { .. } | CatalogError::UnknownGeneration { .. },
            ) => {
                return MigrationStatus::CorruptedStore;
            }
            Err(CatalogError::InvalidModel { .. }) => {
                return MigrationStatus::NoManagedObjectModel;
            }
        };

        if self.catalog.validate_destination().is_err() {
            return MigrationStatus::NoManagedObjectModel;
        }
        let new = self.catalog.destination();

        if old.is_same_model(new) {
            return MigrationStatus::SameModel;
        }

        let specific = match self.registry.find_specific(old, new) {
            Ok(found) => found.is_some(),
            Err(e) => {
                // An ambiguous registry is a defect; for classification it
                // counts as no usable specific mapping. The specific entry
                // point surfaces the error itself.
                tracing::warn!(error = %e, "specific mapping lookup failed");
                false
            }
        };
        let inferred = can_infer(old, new);

        let status = match (specific, inferred) {
            (true, true) => MigrationStatus::AnyMappingModel,
            (false, true) => MigrationStatus::InferredMappingModel,
            (true, false) => MigrationStatus::SpecificMappingModel,
            (false, false) => MigrationStatus::NoMappingModel,
        };
        tracing::debug!(%status, "classified migration status");
        status
    }
}
