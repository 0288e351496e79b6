//! Persistent store access: handles, stored records, and the working
//! copy used as the migration target.

mod handle;
mod record;
mod swap;

pub use handle::{StoreEngineKind, StoreHandle};
pub use record::StoredRecord;

pub(crate) use swap::WorkingCopy;

/// Current time in microseconds since the Unix epoch.
pub(crate) fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
