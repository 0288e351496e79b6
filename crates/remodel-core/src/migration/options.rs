//! Migration options.

use thiserror::Error;

/// Invalid option values, rejected at construction.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The backup extension would escape the store's directory.
    #[error("backup extension {extension:?} must not contain a path separator")]
    InvalidBackupExtension {
        /// The offending value.
        extension: String,
    },
}

/// Configuration for one migration invocation.
///
/// With a backup extension set, the pre-migration store is preserved
/// after a successful migration by renaming it with the extension
/// appended; otherwise the old store is overwritten.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    backup_extension: Option<String>,
}

impl MigrationOptions {
    /// Options with defaults: no backup, old store overwritten.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preserve the pre-migration store under the given extension.
    ///
    /// The extension is appended literally to the store's file name
    /// (`".bak"` turns `store.db` into `store.db.bak`). An empty
    /// extension means no backup, matching the default.
    pub fn with_backup_extension(
        mut self,
        extension: impl Into<String>,
    ) -> Result<Self, OptionsError> {
        let extension = extension.into();
        if extension.contains(std::path::MAIN_SEPARATOR) || extension.contains('/') {
            return Err(OptionsError::InvalidBackupExtension { extension });
        }
        self.backup_extension = if extension.is_empty() {
            None
        } else {
            Some(extension)
        };
        Ok(self)
    }

    /// The backup extension, if one is set.
    pub fn backup_extension(&self) -> Option<&str> {
        self.backup_extension.as_deref()
    }
}
