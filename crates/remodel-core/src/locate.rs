//! Basename naming convention for model and store locations.

use std::path::{Path, PathBuf};

/// Location of the schema model document for a basename.
pub fn model_path(dir: &Path, basename: &str) -> PathBuf {
    dir.join(format!("{basename}.model.json"))
}

/// Location of the persistent store for a basename.
pub fn store_path(dir: &Path, basename: &str) -> PathBuf {
    dir.join(format!("{basename}.db"))
}
