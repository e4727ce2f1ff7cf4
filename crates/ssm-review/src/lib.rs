#![deny(unsafe_code)]

//! Mapping review state and reconciliation.
//!
//! - [`ReviewStore`]: owner of references, imports, mappings, threshold and tab
//! - [`derive_view`]: pure reconciliation into a [`ReconciledView`]
//! - [`ViewCache`]: revision-keyed memoization of the view

pub mod cache;
pub mod reconcile;
pub mod store;

pub use cache::{Versioned, ViewCache};
pub use reconcile::{
    ClassifiedMapping, DanglingMapping, Link, MissingSide, ReconciledView, ReviewSummary,
    derive_view,
};
pub use store::{
    ReviewStore, SharedStore, StoreChange, StoreVersions, SubscriptionId, lock_store,
};
