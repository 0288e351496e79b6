//! Conventional mapping-model registry.

use super::model::MappingModel;
use crate::catalog::SchemaModel;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filename suffix for mapping documents.
const MAPPING_SUFFIX: &str = ".mapping.json";

/// Errors raised by mapping-model resolution.
#[derive(Debug, Error)]
pub enum MappingError {
    /// More than one registered mapping applies to the model pair.
    ///
    /// Ambiguity is a defect in the registry contents and is surfaced,
    /// never resolved by picking one.
    #[error(
        "ambiguous mapping models from {source_hash} to {destination_hash}: {count} candidates"
    )]
    Ambiguous {
        /// Source model version hash.
        source_hash: String,
        /// Destination model version hash.
        destination_hash: String,
        /// Number of applicable mappings found.
        count: usize,
    },

    /// A mapping document could not be read or parsed.
    #[error("failed to load mapping document {path}: {source}")]
    Document {
        /// Path of the offending document.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: crate::error::Error,
    },

    /// The registry directory could not be scanned.
    #[error("failed to scan mapping directory {path}: {source}")]
    Scan {
        /// The directory.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Registry of explicit mapping models.
///
/// Models come from in-memory registration or from scanning a directory
/// for `*.mapping.json` documents by convention.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    models: Vec<MappingModel>,
}

impl MappingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping model.
    pub fn register(&mut self, model: MappingModel) {
        self.models.push(model);
    }

    /// Register a mapping model, builder style.
    pub fn with_model(mut self, model: MappingModel) -> Self {
        self.register(model);
        self
    }

    /// Build a registry by scanning a directory for mapping documents.
    ///
    /// Documents are loaded in name order so registry contents are
    /// deterministic.
    pub fn scan_dir(dir: impl AsRef<Path>) -> Result<Self, MappingError> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|source| MappingError::Scan {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(MAPPING_SUFFIX))
            })
            .collect();
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let model =
                MappingModel::from_json_file(&path).map_err(|source| MappingError::Document {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), name = %model.name, "registered mapping model");
            registry.register(model);
        }
        Ok(registry)
    }

    /// All registered models.
    pub fn models(&self) -> &[MappingModel] {
        &self.models
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Find the unique mapping model for a model pair.
    ///
    /// Returns the match if exactly one applies, `None` if none does, and
    /// `MappingError::Ambiguous` when several do.
    pub fn find_specific(
        &self,
        source: &SchemaModel,
        destination: &SchemaModel,
    ) -> Result<Option<&MappingModel>, MappingError> {
        let matches: Vec<&MappingModel> = self
            .models
            .iter()
            .filter(|m| m.matches(source, destination))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            count => Err(MappingError::Ambiguous {
                source_hash: source.version_hash(),
                destination_hash: destination.version_hash(),
                count,
            }),
        }
    }
}
