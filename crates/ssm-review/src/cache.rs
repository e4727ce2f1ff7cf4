//! Version-tracked cache for the reconciled view.
//!
//! The view is cheap to rebuild, so the cache is an optimisation only: it
//! stores the last view along with the store revision it was computed from
//! and rebuilds when the revision moves.

use tracing::trace;

use crate::reconcile::ReconciledView;
use crate::store::ReviewStore;

/// Wrapper for cached data that tracks when it was computed.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The cached data
    pub data: T,
    /// Store revision when this was computed
    pub source_version: u64,
}

impl<T> Versioned<T> {
    /// Returns `true` if the source has changed since this was computed.
    #[inline]
    pub fn is_stale(&self, current_version: u64) -> bool {
        self.source_version != current_version
    }
}

/// Memoized [`ReviewStore::derive_view`].
#[derive(Debug, Default)]
pub struct ViewCache {
    cached: Option<Versioned<ReconciledView>>,
    rebuilds: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the view for the store's current state, rebuilding if stale.
    pub fn view(&mut self, store: &ReviewStore) -> &ReconciledView {
        let current = store.view_revision();
        if self.cached.as_ref().is_some_and(|c| c.is_stale(current)) {
            trace!(current, "reconciled view is stale");
            self.cached = None;
        }
        let rebuilds = &mut self.rebuilds;
        let entry = self.cached.get_or_insert_with(|| {
            *rebuilds += 1;
            Versioned {
                data: store.derive_view(),
                source_version: current,
            }
        });
        &entry.data
    }

    /// True when a view is cached for the store's current revision.
    pub fn is_fresh(&self, store: &ReviewStore) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|c| !c.is_stale(store.view_revision()))
    }

    /// Number of times the view has been computed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
