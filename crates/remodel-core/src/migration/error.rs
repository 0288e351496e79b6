//! Migration error taxonomy.

use crate::mapping::MappingError;
use std::path::PathBuf;
use thiserror::Error;

/// Error domain for migration failures.
pub const ERROR_DOMAIN: &str = "remodel.migration";

/// Terminal migration failures, delivered through completion callbacks.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migration was cancelled by the caller.
    #[error("migration cancelled by user")]
    CancelledByUser,

    /// The new schema model is absent or structurally invalid.
    #[error("managed schema model is invalid: {reason}")]
    NoManagedObjectModel {
        /// Validation failure description.
        reason: String,
    },

    /// No persistent store exists at the location.
    #[error("no persistent store at {path}")]
    NoPersistentStore {
        /// The store location.
        path: PathBuf,
    },

    /// The store exists but cannot be mapped to any known schema.
    #[error("persistent store at {path} is corrupted: {reason}")]
    CorruptedStore {
        /// The store location.
        path: PathBuf,
        /// What made the store unusable.
        reason: String,
    },

    /// No mapping model applies to the requested strategy.
    #[error("no suitable mapping model for migration")]
    NoMappingModel,

    /// More than one specific mapping model applies.
    #[error(transparent)]
    AmbiguousMapping(#[from] MappingError),

    /// Another migration is already in progress on this manager.
    #[error("a migration is already in progress")]
    AlreadyInProgress,

    /// The underlying engine failed mid-migration.
    #[error("migration failed: {0}")]
    Underlying(#[from] crate::error::Error),

    /// Preserving the previous store failed after a successful migration.
    ///
    /// Non-fatal: the migration is still counted successful and the live
    /// store reflects the new schema.
    #[error("backup of previous store failed: {0}")]
    BackupFailed(#[source] std::io::Error),
}

impl MigrationError {
    /// Stable integer code within [`ERROR_DOMAIN`].
    pub fn code(&self) -> i32 {
        match self {
            MigrationError::CancelledByUser => 1,
            MigrationError::NoManagedObjectModel { .. } => 2,
            MigrationError::NoPersistentStore { .. } => 3,
            MigrationError::CorruptedStore { .. } => 4,
            MigrationError::NoMappingModel => 5,
            MigrationError::AmbiguousMapping(_) => 6,
            MigrationError::AlreadyInProgress => 7,
            MigrationError::Underlying(_) => 8,
            MigrationError::BackupFailed(_) => 9,
        }
    }

    /// Whether the migration still succeeded despite this error.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, MigrationError::BackupFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(MigrationError::CancelledByUser.code(), 1);
        assert_eq!(
            MigrationError::NoManagedObjectModel {
                reason: "empty".into()
            }
            .code(),
            2
        );
        assert_eq!(MigrationError::AlreadyInProgress.code(), 7);
    }

    #[test]
    fn test_underlying_cause_is_preserved() {
        let cause = crate::error::Error::InvalidData("bad row".to_string());
        let err = MigrationError::Underlying(cause);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("bad row"));
    }

    #[test]
    fn test_backup_failed_is_non_fatal() {
        let err = MigrationError::BackupFailed(std::io::Error::other("rename failed"));
        assert!(err.is_non_fatal());
        assert!(!MigrationError::CancelledByUser.is_non_fatal());
    }
}
