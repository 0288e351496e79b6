//! Per-invocation migration context: published progress, the entity
//! mapping being processed, and the cancellation flag.

use crate::mapping::EntityMapping;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Mutable state of one migration invocation.
///
/// Created fresh when an invocation is admitted and frozen at
/// completion. The worker is the only writer; callers may read
/// concurrently from any thread. Progress is published as f32 bits in an
/// atomic with release/acquire ordering, so reads are never torn (though
/// they may be slightly stale).
#[derive(Debug, Default)]
pub(crate) struct ProgressState {
    /// Migration progress in [0, 1], stored as f32 bits.
    progress: AtomicU32,
    /// The entity mapping currently being processed.
    current: RwLock<Option<EntityMapping>>,
    /// Cancellation request flag.
    cancelled: AtomicBool,
}

impl ProgressState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current progress value.
    pub(crate) fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Acquire))
    }

    /// Publish a new progress value, clamped to [0, 1].
    ///
    /// Non-negative f32 bit patterns order the same way as the floats
    /// themselves, so `fetch_max` keeps the published value monotonically
    /// non-decreasing no matter how callers interleave reads.
    pub(crate) fn set_progress(&self, value: f32) {
        let clamped = value.clamp(0.0, 1.0);
        self.progress.fetch_max(clamped.to_bits(), Ordering::AcqRel);
    }

    /// The entity mapping currently being processed.
    pub(crate) fn current_mapping(&self) -> Option<EntityMapping> {
        self.current.read().clone()
    }

    /// Publish the entity mapping about to be processed.
    pub(crate) fn set_current_mapping(&self, mapping: EntityMapping) {
        *self.current.write() = Some(mapping);
    }

    /// Request cancellation.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
