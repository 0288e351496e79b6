//! Migration manager - the public entry point.
//!
//! Owns the collaborators (schema catalog, mapping registry, store
//! handle) and the lifecycle of one migration invocation at a time.

use super::error::MigrationError;
use super::executor::{CompletionFn, ExecutorConfig, MigrationExecutor, ProgressFn, Strategy};
use super::options::MigrationOptions;
use super::planner::MigrationPlanner;
use super::progress::ProgressState;
use super::status::MigrationStatus;
use crate::catalog::{SchemaCatalog, SchemaModel};
use crate::error::Error;
use crate::locate;
use crate::mapping::{EntityMapping, MappingRegistry};
use crate::store::{StoreEngineKind, StoreHandle};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Lifecycle of one migration invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// No migration has been started.
    Idle,
    /// Preconditions are being validated.
    Preparing,
    /// The transform is running against the working copy.
    Running,
    /// The last migration completed and the store was swapped.
    Completed,
    /// The last migration was cancelled; the live store is untouched.
    Cancelled,
    /// The last migration failed; the live store is untouched.
    Failed,
}

impl std::fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationPhase::Idle => write!(f, "idle"),
            MigrationPhase::Preparing => write!(f, "preparing"),
            MigrationPhase::Running => write!(f, "running"),
            MigrationPhase::Completed => write!(f, "completed"),
            MigrationPhase::Cancelled => write!(f, "cancelled"),
            MigrationPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Manages versioned migration of one persistent store.
///
/// Construction binds the destination schema model and the store
/// location. Query [`migration_status`](Self::migration_status) to learn
/// which strategy applies, then invoke one of the two migration entry
/// points. Migration runs on a dedicated worker thread; progress and the
/// current entity mapping may be polled concurrently, and completion is
/// always delivered through the completion callback, exactly once.
///
/// After a successful migration the live store is replaced; any open
/// handle bound to the pre-migration store must be considered
/// invalidated and reopened by the caller.
pub struct MigrationManager {
    catalog: Arc<SchemaCatalog>,
    registry: Arc<MappingRegistry>,
    store: Arc<StoreHandle>,
    config: ExecutorConfig,
    phase: Arc<Mutex<MigrationPhase>>,
    state: RwLock<Arc<ProgressState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MigrationManager {
    /// Create a manager for the given destination model and store.
    pub fn new(
        model: SchemaModel,
        store_path: impl Into<PathBuf>,
        engine: StoreEngineKind,
    ) -> Self {
        Self {
            catalog: Arc::new(SchemaCatalog::new(model)),
            registry: Arc::new(MappingRegistry::new()),
            store: Arc::new(StoreHandle::new(store_path, engine)),
            config: ExecutorConfig::default(),
            phase: Arc::new(Mutex::new(MigrationPhase::Idle)),
            state: RwLock::new(Arc::new(ProgressState::new())),
            worker: Mutex::new(None),
        }
    }

    /// Create a manager using the basename naming convention.
    ///
    /// The destination model is loaded from `<dir>/<basename>.model.json`
    /// and the store is assumed at `<dir>/<basename>.db` with the sled
    /// engine.
    pub fn with_basename(dir: impl AsRef<Path>, basename: &str) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let model = SchemaModel::from_json_file(locate::model_path(dir, basename))?;
        Ok(Self::new(
            model,
            locate::store_path(dir, basename),
            StoreEngineKind::Sled,
        ))
    }

    /// Supply the known schema generations the old model is resolved from.
    pub fn with_model_history(mut self, history: Vec<SchemaModel>) -> Self {
        let catalog =
            SchemaCatalog::new(self.catalog.destination().clone()).with_history(history);
        self.catalog = Arc::new(catalog);
        self
    }

    /// Supply the mapping-model registry.
    pub fn with_mapping_registry(mut self, registry: MappingRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Override executor tuning.
    pub fn with_executor_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// The destination schema model.
    pub fn model(&self) -> &SchemaModel {
        self.catalog.destination()
    }

    /// The migration target store.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// The lifecycle phase of the current or last invocation.
    pub fn phase(&self) -> MigrationPhase {
        *self.phase.lock()
    }

    /// Classify the store/model pair.
    ///
    /// Pure query with no side effects, recomputed on each call; reflects
    /// the live target store even while a migration is running.
    pub fn migration_status(&self) -> MigrationStatus {
        MigrationPlanner::new(&self.catalog, &self.registry, &self.store).status()
    }

    /// Progress of the current invocation in [0, 1].
    ///
    /// Only the specific-mapping path updates this value.
    pub fn migration_progress(&self) -> f32 {
        self.state.read().progress()
    }

    /// The entity mapping currently being processed.
    ///
    /// Only the specific-mapping path updates this value.
    pub fn current_entity_mapping(&self) -> Option<EntityMapping> {
        self.state.read().current_mapping()
    }

    /// Request cancellation of the running migration.
    ///
    /// Sets a flag and returns immediately; effective only while the
    /// specific-mapping path is running, and a no-op once the terminal
    /// swap has begun. The inferred-mapping path cannot be cancelled.
    pub fn cancel(&self) {
        self.state.read().cancel();
    }

    /// Migrate using an inferred mapping model.
    ///
    /// One non-interruptible unit of work: progress and the current
    /// entity mapping are not updated, and cancellation has no effect.
    /// Requires status `AnyMappingModel` or `InferredMappingModel`;
    /// otherwise the completion callback receives the mirrored error.
    pub fn migrate_by_inferred(
        &self,
        options: MigrationOptions,
        on_complete: impl FnOnce(Option<MigrationError>) + Send + 'static,
    ) {
        self.begin(Strategy::Inferred, options, None, Box::new(on_complete));
    }

    /// Migrate using the registered specific mapping model.
    ///
    /// Processes entity mappings in declared order, publishing progress
    /// and the current mapping, and invoking `on_progress` at least once
    /// per entity boundary. Requires status `AnyMappingModel` or
    /// `SpecificMappingModel`.
    pub fn migrate_by_specific(
        &self,
        options: MigrationOptions,
        on_progress: impl FnMut(f32, &EntityMapping) + Send + 'static,
        on_complete: impl FnOnce(Option<MigrationError>) + Send + 'static,
    ) {
        self.begin(
            Strategy::Specific,
            options,
            Some(Box::new(on_progress)),
            Box::new(on_complete),
        );
    }

    /// Block until the current worker finishes.
    pub fn wait(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn begin(
        &self,
        strategy: Strategy,
        options: MigrationOptions,
        mut progress: Option<ProgressFn>,
        on_complete: CompletionFn,
    ) {
        {
            let mut phase = self.phase.lock();
            match *phase {
                MigrationPhase::Preparing | MigrationPhase::Running => {
                    drop(phase);
                    tracing::warn!("migration rejected, another invocation is in flight");
                    on_complete(Some(MigrationError::AlreadyInProgress));
                    return;
                }
                _ => *phase = MigrationPhase::Preparing,
            }
        }

        // Fresh per-invocation context; published before the worker spawns
        // so an immediate cancel() targets this invocation.
        let state = Arc::new(ProgressState::new());
        *self.state.write() = Arc::clone(&state);

        let executor = MigrationExecutor::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            self.config.clone(),
        );
        let phase = Arc::clone(&self.phase);

        let handle = std::thread::spawn(move || {
            let running_phase = Arc::clone(&phase);
            let outcome = executor.run(strategy, &options, &state, &mut progress, move || {
                *running_phase.lock() = MigrationPhase::Running;
            });

            *phase.lock() = match &outcome {
                Ok(_) => MigrationPhase::Completed,
                Err(MigrationError::CancelledByUser) => MigrationPhase::Cancelled,
                Err(_) => MigrationPhase::Failed,
            };

            match outcome {
                Ok(non_fatal) => on_complete(non_fatal),
                Err(e) => {
                    tracing::warn!(error = %e, "migration did not complete");
                    on_complete(Some(e));
                }
            }
        });

        *self.worker.lock() = Some(handle);
    }
}

impl Drop for MigrationManager {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.get_mut().take() {
            let _ = handle.join();
        }
    }
}
