//! Store handle: location, engine kind, and shared access to the
//! underlying database.

use crate::catalog::SchemaModel;
use crate::error::Error;
use parking_lot::{Mutex, MutexGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tree name for store-embedded metadata.
const META_TREE: &str = "store:meta";

/// Metadata key for the serialized schema model.
const SCHEMA_KEY: &[u8] = b"schema";

/// Metadata key for the schema version hash.
const SCHEMA_HASH_KEY: &[u8] = b"schema_hash";

/// Storage engine backing a persistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEngineKind {
    /// A sled database directory.
    Sled,
}

impl std::fmt::Display for StoreEngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreEngineKind::Sled => write!(f, "sled"),
        }
    }
}

/// Identifies a persistent store by location and engine kind.
///
/// The handle caches one shared open database so that status queries and
/// a running migration observe the same instance (sled refuses a second
/// open of the same path). The cache is dropped for the swap step and
/// lazily reopened afterwards.
pub struct StoreHandle {
    path: PathBuf,
    engine: StoreEngineKind,
    db: Mutex<Option<Arc<sled::Db>>>,
}

impl StoreHandle {
    /// Create a handle for the given location.
    pub fn new(path: impl Into<PathBuf>, engine: StoreEngineKind) -> Self {
        Self {
            path: path.into(),
            engine,
            db: Mutex::new(None),
        }
    }

    /// The store location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The storage engine kind.
    pub fn engine(&self) -> StoreEngineKind {
        self.engine
    }

    /// Whether a store exists at the location.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Open the store, reusing the cached instance when present.
    pub fn open(&self) -> Result<Arc<sled::Db>, Error> {
        let mut slot = self.db.lock();
        if let Some(db) = slot.as_ref() {
            return Ok(Arc::clone(db));
        }

        let db = Arc::new(sled::Config::new().path(&self.path).open()?);
        *slot = Some(Arc::clone(&db));
        Ok(db)
    }

    /// Drop the cached database instance.
    pub fn close(&self) {
        *self.db.lock() = None;
    }

    /// Exclusive access to the cached-database slot.
    ///
    /// Held across the swap step so no reader reopens the store while its
    /// directory is being renamed.
    pub(crate) fn db_slot(&self) -> MutexGuard<'_, Option<Arc<sled::Db>>> {
        self.db.lock()
    }

    /// Read the schema version hash embedded in the store metadata.
    pub fn read_schema_hash(&self) -> Result<Option<String>, Error> {
        let db = self.open()?;
        let meta = db.open_tree(META_TREE)?;
        match meta.get(SCHEMA_HASH_KEY)? {
            Some(bytes) => {
                let hash = String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::Deserialization(e.to_string()))?;
                Ok(Some(hash))
            }
            None => Ok(None),
        }
    }

    /// Read the full schema model embedded in the store metadata.
    pub fn read_schema_model(&self) -> Result<Option<SchemaModel>, Error> {
        let db = self.open()?;
        let meta = db.open_tree(META_TREE)?;
        match meta.get(SCHEMA_KEY)? {
            Some(bytes) => Ok(Some(SchemaModel::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Embed a schema model (and its hash) in the store metadata.
    pub fn write_schema_model(&self, model: &SchemaModel) -> Result<(), Error> {
        let db = self.open()?;
        let meta = db.open_tree(META_TREE)?;
        meta.insert(SCHEMA_KEY, model.to_bytes()?)?;
        meta.insert(SCHEMA_HASH_KEY, model.version_hash().as_bytes())?;
        meta.flush()?;
        Ok(())
    }

    /// Open the data tree for an entity.
    pub fn entity_tree(&self, entity: &str) -> Result<sled::Tree, Error> {
        let db = self.open()?;
        Ok(db.open_tree(entity_tree_name(entity))?)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        let db = self.open()?;
        db.flush()?;
        Ok(())
    }
}

/// Tree name for an entity's data.
fn entity_tree_name(entity: &str) -> String {
    format!("entity:{entity}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttrValue, AttributeDef, EntityDef, ScalarType};
    use crate::store::StoredRecord;

    fn sample_model() -> SchemaModel {
        SchemaModel::new(1).with_entity(
            EntityDef::new("User", "id")
                .with_attribute(AttributeDef::new("id", ScalarType::Uuid)),
        )
    }

    #[test]
    fn test_exists() {
        let dir = tempfile::tempdir().unwrap();
        let handle = StoreHandle::new(dir.path().join("s.db"), StoreEngineKind::Sled);

        assert!(!handle.exists());
        handle.open().unwrap();
        assert!(handle.exists());
    }

    #[test]
    fn test_schema_metadata_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let handle = StoreHandle::new(dir.path().join("s.db"), StoreEngineKind::Sled);

        assert!(handle.read_schema_hash().unwrap().is_none());

        let model = sample_model();
        handle.write_schema_model(&model).unwrap();

        assert_eq!(
            handle.read_schema_hash().unwrap().as_deref(),
            Some(model.version_hash().as_str())
        );
        let loaded = handle.read_schema_model().unwrap().unwrap();
        assert!(loaded.is_same_model(&model));
    }

    #[test]
    fn test_entity_tree_persists_records() {
        let dir = tempfile::tempdir().unwrap();
        let handle = StoreHandle::new(dir.path().join("s.db"), StoreEngineKind::Sled);

        let tree = handle.entity_tree("User").unwrap();
        let record = StoredRecord::new(vec![("id".to_string(), AttrValue::Uuid([1u8; 16]))]);
        tree.insert([1u8; 16], record.to_bytes().unwrap()).unwrap();
        handle.flush().unwrap();
        handle.close();

        let tree = handle.entity_tree("User").unwrap();
        let bytes = tree.get([1u8; 16]).unwrap().unwrap();
        let loaded = StoredRecord::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_open_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let handle = StoreHandle::new(dir.path().join("s.db"), StoreEngineKind::Sled);

        let a = handle.open().unwrap();
        let b = handle.open().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
