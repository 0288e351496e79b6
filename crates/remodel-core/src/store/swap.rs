//! Working copy lifecycle: creation, discard, and the terminal
//! swap/backup of a successful migration.

use super::handle::StoreHandle;
use crate::catalog::SchemaModel;
use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of the swap step.
///
/// A backup failure is recorded rather than returned as an error: the
/// migration itself has already succeeded by the time the backup rename
/// runs, and must stay successful.
pub(crate) struct SwapReport {
    /// Where the pre-migration store was preserved, if requested and
    /// successful.
    pub backup_path: Option<PathBuf>,
    /// Why the backup rename failed, when it did.
    pub backup_error: Option<std::io::Error>,
}

/// Ephemeral migration target created next to the live store and swapped
/// into its place on success.
pub(crate) struct WorkingCopy {
    handle: StoreHandle,
}

impl WorkingCopy {
    /// Create a fresh working copy carrying the destination schema.
    ///
    /// A leftover working copy from a crashed run at the same location is
    /// removed first.
    pub(crate) fn create(live: &StoreHandle, destination: &SchemaModel) -> Result<Self, Error> {
        let path = working_path(live.path());
        if path.exists() {
            tracing::warn!(path = %path.display(), "removing leftover working copy");
            fs::remove_dir_all(&path)?;
        }

        let handle = StoreHandle::new(path, live.engine());
        handle.write_schema_model(destination)?;
        Ok(Self { handle })
    }

    /// The working store handle.
    pub(crate) fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Delete the working copy, leaving the live store untouched.
    pub(crate) fn discard(self) {
        self.handle.close();
        if let Err(e) = fs::remove_dir_all(self.handle.path()) {
            tracing::warn!(
                path = %self.handle.path().display(),
                error = %e,
                "failed to remove discarded working copy"
            );
        }
    }

    /// Replace the live store with the working copy.
    ///
    /// With a non-empty `backup_extension` the live store is first renamed
    /// by appending the extension; if that rename fails the live store is
    /// deleted instead and the failure is recorded in the report. The
    /// working copy is then renamed into the live location. On an error
    /// from this final step the working copy is left on disk as the
    /// recovery path.
    pub(crate) fn commit(
        self,
        live: &StoreHandle,
        backup_extension: Option<&str>,
    ) -> Result<SwapReport, Error> {
        self.handle.flush()?;
        self.handle.close();

        let mut report = SwapReport {
            backup_path: None,
            backup_error: None,
        };

        // Hold the live handle's database slot for the whole swap so no
        // concurrent status query reopens the store mid-rename.
        let mut live_slot = live.db_slot();
        *live_slot = None;

        match backup_extension {
            Some(ext) if !ext.is_empty() => {
                let backup = append_extension(live.path(), ext);
                match fs::rename(live.path(), &backup) {
                    Ok(()) => {
                        tracing::info!(backup = %backup.display(), "preserved previous store");
                        report.backup_path = Some(backup);
                    }
                    Err(e) => {
                        tracing::warn!(
                            backup = %backup.display(),
                            error = %e,
                            "backup rename failed, deleting previous store"
                        );
                        report.backup_error = Some(e);
                        if live.path().exists() {
                            fs::remove_dir_all(live.path())?;
                        }
                    }
                }
            }
            _ => {
                if live.path().exists() {
                    fs::remove_dir_all(live.path())?;
                }
            }
        }

        fs::rename(self.handle.path(), live.path())?;
        Ok(report)
    }
}

/// Location of the working copy for a live store.
fn working_path(live: &Path) -> PathBuf {
    append_extension(live, ".migration")
}

/// Append a literal extension to the last path component.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(ext);
    path.with_file_name(name)
}
