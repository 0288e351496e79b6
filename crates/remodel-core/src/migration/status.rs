//! Migration status classification.

/// Classification of a store/model pair, computed fresh on each query.
///
/// Exactly one value holds at a time; the classification is a pure
/// function of store readability, old-model resolvability, new-model
/// validity and mapping availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationStatus {
    /// Old and new model are the same; no migration is needed.
    SameModel,
    /// Both migration strategies are available.
    AnyMappingModel,
    /// Only inferred-mapping migration is available.
    InferredMappingModel,
    /// Only specific-mapping migration is available.
    SpecificMappingModel,
    /// No suitable mapping model exists; migration is impossible.
    NoMappingModel,
    /// The new schema model is absent or invalid.
    NoManagedObjectModel,
    /// No persistent store exists at the location, or it is unreadable.
    NoPersistentStore,
    /// The store exists but its metadata matches no known schema.
    CorruptedStore,
}

impl MigrationStatus {
    /// Whether the inferred-mapping strategy may be used.
    pub fn allows_inferred(&self) -> bool {
        matches!(
            self,
            MigrationStatus::AnyMappingModel | MigrationStatus::InferredMappingModel
        )
    }

    /// Whether the specific-mapping strategy may be used.
    pub fn allows_specific(&self) -> bool {
        matches!(
            self,
            MigrationStatus::AnyMappingModel | MigrationStatus::SpecificMappingModel
        )
    }

    /// Whether a migration is both needed and possible.
    pub fn needs_migration(&self) -> bool {
        self.allows_inferred() || self.allows_specific()
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStatus::SameModel => write!(f, "same_model"),
            MigrationStatus::AnyMappingModel => write!(f, "any_mapping_model"),
            MigrationStatus::InferredMappingModel => write!(f, "inferred_mapping_model"),
            MigrationStatus::SpecificMappingModel => write!(f, "specific_mapping_model"),
            MigrationStatus::NoMappingModel => write!(f, "no_mapping_model"),
            MigrationStatus::NoManagedObjectModel => write!(f, "no_managed_object_model"),
            MigrationStatus::NoPersistentStore => write!(f, "no_persistent_store"),
            MigrationStatus::CorruptedStore => write!(f, "corrupted_store"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_availability() {
        assert!(MigrationStatus::AnyMappingModel.allows_inferred());
        assert!(MigrationStatus::AnyMappingModel.allows_specific());
        assert!(MigrationStatus::InferredMappingModel.allows_inferred());
        assert!(!MigrationStatus::InferredMappingModel.allows_specific());
        assert!(!MigrationStatus::SpecificMappingModel.allows_inferred());
        assert!(MigrationStatus::SpecificMappingModel.allows_specific());
        assert!(!MigrationStatus::SameModel.needs_migration());
        assert!(!MigrationStatus::NoMappingModel.needs_migration());
    }

    #[test]
    fn test_display() {
        assert_eq!(MigrationStatus::SameModel.to_string(), "same_model");
        assert_eq!(MigrationStatus::CorruptedStore.to_string(), "corrupted_store");
    }
}
