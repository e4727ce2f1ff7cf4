//! Review store: the single owner of the review collections.
//!
//! The store is an explicit context object handed to every component rather
//! than process-wide state. Each operation touches exactly one collection,
//! runs to completion, bumps that collection's version and notifies
//! subscribers before returning.
//!
//! # Soft invalidation
//!
//! Removing an import or replacing the reference list never deletes the
//! mappings that point at them. Those mappings become dangling and are
//! filtered out by [`crate::derive_view`] on the next read.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ssm_model::{
    ActiveTab, ImportDraft, ImportField, ImportId, ImportedVariable, Mapping, MappingCandidate,
    MappingId, RefId, ReferenceVariable, Threshold,
};
use tracing::{debug, warn};

use crate::reconcile::{ReconciledView, derive_view};

/// Store shared between the presentation and in-flight gateway requests.
///
/// The lock is only held for the duration of one store operation and never
/// across an await point.
pub type SharedStore = Arc<Mutex<ReviewStore>>;

/// Lock a shared store, recovering the data if a previous holder panicked.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ReviewStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-collection mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StoreVersions {
    pub references: u64,
    pub imports: u64,
    pub mappings: u64,
    pub threshold: u64,
    pub active_tab: u64,
}

/// Notification delivered to subscribers after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    ReferencesReplaced { count: usize },
    ImportAdded(ImportId),
    ImportUpdated(ImportId),
    ImportRemoved(ImportId),
    ImportsReplaced { count: usize },
    MappingsAdded { count: usize },
    MappingRemoved(MappingId),
    MappingsRemovedForImport { import_id: ImportId, count: usize },
    MappingsReplaced { count: usize },
    ThresholdChanged(Threshold),
    ActiveTabChanged(ActiveTab),
}

/// Handle returned by [`ReviewStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreChange) + Send>;

/// In-memory state of one review session.
pub struct ReviewStore {
    references: Vec<ReferenceVariable>,
    imports: Vec<ImportedVariable>,
    mappings: Vec<Mapping>,
    threshold: Threshold,
    active_tab: ActiveTab,
    versions: StoreVersions,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for ReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReviewStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewStore")
            .field("references", &self.references.len())
            .field("imports", &self.imports.len())
            .field("mappings", &self.mappings.len())
            .field("threshold", &self.threshold)
            .field("active_tab", &self.active_tab)
            .field("versions", &self.versions)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ReviewStore {
    pub fn new() -> Self {
        Self {
            references: Vec::new(),
            imports: Vec::new(),
            mappings: Vec::new(),
            threshold: Threshold::default(),
            active_tab: ActiveTab::default(),
            versions: StoreVersions::default(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Wrap a fresh store for sharing with async workflows.
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn references(&self) -> &[ReferenceVariable] {
        &self.references
    }

    pub fn imports(&self) -> &[ImportedVariable] {
        &self.imports
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    pub fn versions(&self) -> StoreVersions {
        self.versions
    }

    /// Sum of the versions that feed [`derive_view`]. Tab changes are
    /// excluded since they do not affect the view.
    pub fn view_revision(&self) -> u64 {
        self.versions.references
            + self.versions.imports
            + self.versions.mappings
            + self.versions.threshold
    }

    pub fn import(&self, id: &ImportId) -> Option<&ImportedVariable> {
        self.imports.iter().find(|i| &i.import_id == id)
    }

    pub fn has_import(&self, id: &ImportId) -> bool {
        self.import(id).is_some()
    }

    pub fn reference(&self, id: &RefId) -> Option<&ReferenceVariable> {
        self.references.iter().find(|r| &r.ref_id == id)
    }

    /// Recompute the reconciled view from the current state.
    pub fn derive_view(&self) -> ReconciledView {
        derive_view(
            &self.references,
            &self.imports,
            &self.mappings,
            self.threshold,
        )
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a callback invoked synchronously after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreChange) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, change: StoreChange) {
        debug!(?change, "store changed");
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Replace the reference collection wholesale.
    ///
    /// A repeated `ref_id` keeps its first occurrence so ids stay unique.
    pub fn set_references(&mut self, references: Vec<ReferenceVariable>) {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(references.len());
        for reference in references {
            if seen.insert(reference.ref_id.clone()) {
                unique.push(reference);
            } else {
                warn!(ref_id = %reference.ref_id, "duplicate reference id dropped");
            }
        }
        let count = unique.len();
        self.references = unique;
        self.versions.references += 1;
        self.notify(StoreChange::ReferencesReplaced { count });
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// Append a new import row and return its generated id.
    pub fn add_import(&mut self, draft: ImportDraft) -> ImportId {
        let id = ImportId::generate();
        self.imports
            .push(ImportedVariable::from_draft(id.clone(), draft));
        self.versions.imports += 1;
        self.notify(StoreChange::ImportAdded(id.clone()));
        id
    }

    /// Replace the editable fields of an import. Returns `false` (and changes
    /// nothing) if the id is unknown.
    pub fn update_import(&mut self, id: &ImportId, draft: ImportDraft) -> bool {
        let Some(row) = self.imports.iter_mut().find(|i| &i.import_id == id) else {
            return false;
        };
        *row = ImportedVariable::from_draft(id.clone(), draft);
        self.versions.imports += 1;
        self.notify(StoreChange::ImportUpdated(id.clone()));
        true
    }

    /// Edit one field of an import. Returns `false` if the id is unknown.
    pub fn update_import_field(
        &mut self,
        id: &ImportId,
        field: ImportField,
        value: impl Into<String>,
    ) -> bool {
        let Some(row) = self.imports.iter_mut().find(|i| &i.import_id == id) else {
            return false;
        };
        row.set_field(field, value);
        self.versions.imports += 1;
        self.notify(StoreChange::ImportUpdated(id.clone()));
        true
    }

    /// Remove an import. Its mappings are left in place.
    pub fn remove_import(&mut self, id: &ImportId) -> bool {
        let before = self.imports.len();
        self.imports.retain(|i| &i.import_id != id);
        if self.imports.len() == before {
            return false;
        }
        self.versions.imports += 1;
        self.notify(StoreChange::ImportRemoved(id.clone()));
        true
    }

    /// Replace every import row, generating fresh ids. Existing mappings are
    /// left in place and become dangling.
    pub fn replace_imports(&mut self, drafts: Vec<ImportDraft>) -> Vec<ImportId> {
        self.imports = drafts
            .into_iter()
            .map(|draft| ImportedVariable::from_draft(ImportId::generate(), draft))
            .collect();
        let ids: Vec<ImportId> = self.imports.iter().map(|i| i.import_id.clone()).collect();
        self.versions.imports += 1;
        self.notify(StoreChange::ImportsReplaced { count: ids.len() });
        ids
    }

    // ========================================================================
    // Mappings
    // ========================================================================

    /// Append mappings, each under a freshly generated id.
    pub fn add_mappings(&mut self, mappings: Vec<Mapping>) -> Vec<MappingId> {
        let ids: Vec<MappingId> = mappings
            .into_iter()
            .map(|mapping| {
                let id = MappingId::generate();
                self.mappings.push(Mapping {
                    id: id.clone(),
                    ..mapping
                });
                id
            })
            .collect();
        self.versions.mappings += 1;
        self.notify(StoreChange::MappingsAdded { count: ids.len() });
        ids
    }

    /// Append the scoring service's candidates for one import.
    pub fn attach_candidates(
        &mut self,
        import_id: &ImportId,
        candidates: Vec<MappingCandidate>,
    ) -> Vec<MappingId> {
        let mappings = candidates
            .into_iter()
            .map(|candidate| candidate.attach(import_id.clone()))
            .collect();
        self.add_mappings(mappings)
    }

    pub fn remove_mapping(&mut self, id: &MappingId) -> bool {
        let before = self.mappings.len();
        self.mappings.retain(|m| &m.id != id);
        if self.mappings.len() == before {
            return false;
        }
        self.versions.mappings += 1;
        self.notify(StoreChange::MappingRemoved(id.clone()));
        true
    }

    /// Remove every mapping of one import and return how many were dropped.
    pub fn remove_mappings_for_import(&mut self, import_id: &ImportId) -> usize {
        let before = self.mappings.len();
        self.mappings.retain(|m| &m.import_id != import_id);
        let count = before - self.mappings.len();
        if count == 0 {
            return 0;
        }
        self.versions.mappings += 1;
        self.notify(StoreChange::MappingsRemovedForImport {
            import_id: import_id.clone(),
            count,
        });
        count
    }

    /// Replace the mapping collection as given, ids included.
    pub fn replace_mappings(&mut self, mappings: Vec<Mapping>) {
        let count = mappings.len();
        self.mappings = mappings;
        self.versions.mappings += 1;
        self.notify(StoreChange::MappingsReplaced { count });
    }

    // ========================================================================
    // Scalars
    // ========================================================================

    /// Set the threshold as given; callers constrain it to [0, 1].
    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.threshold = threshold;
        self.versions.threshold += 1;
        self.notify(StoreChange::ThresholdChanged(threshold));
    }

    pub fn set_active_tab(&mut self, tab: ActiveTab) {
        self.active_tab = tab;
        self.versions.active_tab += 1;
        self.notify(StoreChange::ActiveTabChanged(tab));
    }
}
