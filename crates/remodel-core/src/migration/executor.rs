//! Migration execution: the two-path transform-and-swap state machine.
//!
//! Both strategies build the new store in a working copy next to the
//! live store and swap it in only on success; the live store is never
//! written until the swap step, so cancellation and failure always leave
//! it untouched.

use super::error::MigrationError;
use super::options::MigrationOptions;
use super::planner::MigrationPlanner;
use super::progress::ProgressState;
use super::status::MigrationStatus;
use crate::catalog::{convert, AttributeDef, EntityDef, SchemaCatalog, SchemaModel};
use crate::error::Error;
use crate::mapping::{
    infer_mapping, AttributeTransform, EntityMapping, MappingModel, MappingRegistry,
};
use crate::store::{StoreHandle, StoredRecord, WorkingCopy};
use std::sync::Arc;

/// Completion callback: invoked exactly once per migration invocation.
pub(crate) type CompletionFn = Box<dyn FnOnce(Option<MigrationError>) + Send + 'static>;

/// Progress callback for the specific-mapping path.
pub(crate) type ProgressFn = Box<dyn FnMut(f32, &EntityMapping) + Send + 'static>;

/// Migration strategy selected by the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Structural inference; one non-interruptible unit of work.
    Inferred,
    /// Explicit mapping model; reports progress and honors cancellation.
    Specific,
}

/// Executor tuning knobs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Rows transformed between cancellation checks and progress updates.
    pub batch_size: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { batch_size: 256 }
    }
}

impl ExecutorConfig {
    /// Set the row batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// A migration admitted past precondition validation.
struct PreparedMigration {
    mapping: MappingModel,
    old_model: SchemaModel,
    interruptible: bool,
}

/// Runs one migration invocation on the worker thread.
pub(crate) struct MigrationExecutor {
    catalog: Arc<SchemaCatalog>,
    registry: Arc<MappingRegistry>,
    store: Arc<StoreHandle>,
    config: ExecutorConfig,
}

impl MigrationExecutor {
    pub(crate) fn new(
        catalog: Arc<SchemaCatalog>,
        registry: Arc<MappingRegistry>,
        store: Arc<StoreHandle>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            catalog,
            registry,
            store,
            config,
        }
    }

    /// Validate preconditions and resolve the mapping model.
    ///
    /// Returns `Ok(None)` when the store is already at the destination
    /// schema and there is nothing to migrate.
    fn prepare(&self, strategy: Strategy) -> Result<Option<PreparedMigration>, MigrationError> {
        let planner = MigrationPlanner::new(&self.catalog, &self.registry, &self.store);
        let status = planner.status();
        tracing::info!(%status, ?strategy, "validating migration preconditions");

        if status == MigrationStatus::SameModel {
            return Ok(None);
        }

        // Store- and model-level disqualifications mirror the planner's
        // classification directly.
        if matches!(
            status,
            MigrationStatus::NoPersistentStore
                | MigrationStatus::CorruptedStore
                | MigrationStatus::NoManagedObjectModel
        ) {
            return Err(self.mirror_status(status));
        }

        let old_model = self
            .catalog
            .resolve_old_model(&self.store)
            .map_err(|e| MigrationError::CorruptedStore {
                path: self.store.path().to_path_buf(),
                reason: e.to_string(),
            })?
            .clone();
        let destination = self.catalog.destination();

        // Resolving the mapping enforces the strategy precondition: a
        // strategy whose mapping is unavailable fails with NoMappingModel,
        // and an ambiguous registry surfaces as the defect it is.
        let mapping = match strategy {
            Strategy::Specific => self
                .registry
                .find_specific(&old_model, destination)?
                .ok_or(MigrationError::NoMappingModel)?
                .clone(),
            Strategy::Inferred => {
                infer_mapping(&old_model, destination).ok_or(MigrationError::NoMappingModel)?
            }
        };

        Ok(Some(PreparedMigration {
            mapping,
            old_model,
            interruptible: strategy == Strategy::Specific,
        }))
    }

    /// Map a disqualifying status to the error the entry point reports.
    fn mirror_status(&self, status: MigrationStatus) -> MigrationError {
        match status {
            MigrationStatus::NoPersistentStore => MigrationError::NoPersistentStore {
                path: self.store.path().to_path_buf(),
            },
            MigrationStatus::CorruptedStore => MigrationError::CorruptedStore {
                path: self.store.path().to_path_buf(),
                reason: "store metadata matches no known schema generation".to_string(),
            },
            MigrationStatus::NoManagedObjectModel => MigrationError::NoManagedObjectModel {
                reason: self
                    .catalog
                    .validate_destination()
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "invalid schema model".to_string()),
            },
            _ => MigrationError::NoMappingModel,
        }
    }

    /// Run one migration invocation to its terminal outcome.
    ///
    /// `Ok(None)` is plain success; `Ok(Some(BackupFailed))` is success
    /// with a failed best-effort backup.
    pub(crate) fn run(
        &self,
        strategy: Strategy,
        options: &MigrationOptions,
        state: &ProgressState,
        progress: &mut Option<ProgressFn>,
        on_running: impl FnOnce(),
    ) -> Result<Option<MigrationError>, MigrationError> {
        let prepared = match self.prepare(strategy)? {
            Some(prepared) => prepared,
            None => {
                tracing::info!("store already carries the destination schema");
                if strategy == Strategy::Specific {
                    state.set_progress(1.0);
                }
                return Ok(None);
            }
        };
        on_running();

        tracing::info!(
            mapping = %prepared.mapping.name,
            entities = prepared.mapping.len(),
            "starting migration"
        );

        let working = WorkingCopy::create(&self.store, self.catalog.destination())?;

        if let Err(e) = self.transform(&prepared, &working, state, progress) {
            working.discard();
            return Err(e);
        }

        // Last cancellation point; the swap commits from here on.
        if prepared.interruptible && state.is_cancelled() {
            working.discard();
            return Err(MigrationError::CancelledByUser);
        }

        if prepared.interruptible {
            state.set_progress(1.0);
            if let (Some(cb), Some(last)) = (
                progress.as_mut(),
                prepared.mapping.entity_mappings.last(),
            ) {
                cb(state.progress(), last);
            }
        }

        let report = working.commit(&self.store, options.backup_extension())?;
        tracing::info!("migration complete, working copy swapped in");
        Ok(report.backup_error.map(MigrationError::BackupFailed))
    }

    /// Transform every entity mapping into the working copy.
    fn transform(
        &self,
        prepared: &PreparedMigration,
        working: &WorkingCopy,
        state: &ProgressState,
        progress: &mut Option<ProgressFn>,
    ) -> Result<(), MigrationError> {
        let total = prepared.mapping.len();

        for (index, entity_mapping) in prepared.mapping.entity_mappings.iter().enumerate() {
            if prepared.interruptible {
                if state.is_cancelled() {
                    return Err(MigrationError::CancelledByUser);
                }
                state.set_current_mapping(entity_mapping.clone());
                state.set_progress(index as f32 / total as f32);
                if let Some(cb) = progress.as_mut() {
                    cb(state.progress(), entity_mapping);
                }
            }

            tracing::debug!(mapping = %entity_mapping.name, "processing entity mapping");
            self.migrate_entity(prepared, entity_mapping, working, state, index, total, progress)?;
        }

        Ok(())
    }

    /// Transform the rows of a single entity mapping.
    #[allow(clippy::too_many_arguments)]
    fn migrate_entity(
        &self,
        prepared: &PreparedMigration,
        entity_mapping: &EntityMapping,
        working: &WorkingCopy,
        state: &ProgressState,
        index: usize,
        total: usize,
        progress: &mut Option<ProgressFn>,
    ) -> Result<(), MigrationError> {
        // A fresh destination entity has no source rows to carry over.
        let Some(source_name) = entity_mapping.source_entity.as_deref() else {
            return Ok(());
        };

        if prepared.old_model.entity(source_name).is_none() {
            return Err(Error::InvalidData(format!(
                "mapping {} references unknown source entity {source_name}",
                entity_mapping.name
            ))
            .into());
        }
        let destination_entity = self
            .catalog
            .destination()
            .entity(&entity_mapping.destination_entity)
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "mapping {} targets unknown entity {}",
                    entity_mapping.name, entity_mapping.destination_entity
                ))
            })?;

        let source_tree = self.store.entity_tree(source_name)?;
        let destination_tree = working.handle().entity_tree(&entity_mapping.destination_entity)?;

        let span = 1.0 / total as f32;
        let base = index as f32 * span;
        let total_rows = source_tree.len() as f32;
        let mut processed: u64 = 0;

        for item in source_tree.iter() {
            let (key, value) = item.map_err(Error::from)?;
            let record = StoredRecord::from_bytes(&value)?;
            let migrated = apply_entity_mapping(entity_mapping, destination_entity, &record)?;
            destination_tree
                .insert(key, migrated.to_bytes()?)
                .map_err(Error::from)?;

            processed += 1;
            if prepared.interruptible && processed % self.config.batch_size as u64 == 0 {
                if state.is_cancelled() {
                    return Err(MigrationError::CancelledByUser);
                }
                let fraction = if total_rows > 0.0 {
                    (processed as f32 / total_rows).min(1.0)
                } else {
                    1.0
                };
                state.set_progress(base + fraction * span);
                if let Some(cb) = progress.as_mut() {
                    cb(state.progress(), entity_mapping);
                }
            }
        }

        Ok(())
    }
}

/// Apply one entity mapping to a single record.
fn apply_entity_mapping(
    entity_mapping: &EntityMapping,
    destination: &EntityDef,
    record: &StoredRecord,
) -> Result<StoredRecord, Error> {
    let mut attrs = Vec::with_capacity(entity_mapping.attribute_mappings.len());

    for rule in &entity_mapping.attribute_mappings {
        let attr = destination.attribute(&rule.attribute).ok_or_else(|| {
            Error::InvalidData(format!(
                "mapping {} targets unknown attribute {}.{}",
                entity_mapping.name, destination.name, rule.attribute
            ))
        })?;

        let value = match &rule.transform {
            AttributeTransform::Copy { from } => match record.get(from) {
                Some(value) => value.clone(),
                None => fallback_value(attr)?,
            },
            AttributeTransform::Convert { from } => match record.get(from) {
                Some(value) => convert(value, attr.scalar).ok_or_else(|| {
                    Error::InvalidData(format!(
                        "cannot convert {from} to {} for attribute {}.{}",
                        attr.scalar, destination.name, attr.name
                    ))
                })?,
                None => fallback_value(attr)?,
            },
            AttributeTransform::Default => fallback_value(attr)?,
        };

        attrs.push((rule.attribute.clone(), value));
    }

    Ok(StoredRecord::with_timestamp(attrs, record.created_at))
}

/// Default or null for an attribute with no source value.
fn fallback_value(attr: &AttributeDef) -> Result<crate::catalog::AttrValue, Error> {
    if let Some(default) = &attr.default {
        return Ok(default.clone());
    }
    if attr.optional {
        return Ok(crate::catalog::AttrValue::Null);
    }
    Err(Error::InvalidData(format!(
        "attribute {} has no source value and no default",
        attr.name
    )))
}
