//! Reconciliation of the review collections into a renderable view.
//!
//! [`derive_view`] is a pure function of the three collections and the
//! threshold. It drops dangling mappings, reduces scores to the best score
//! per import, orders references mapped-first and classifies every
//! surviving link against the threshold. It is cheap enough to rerun after
//! every store mutation.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use ssm_model::{
    ImportId, ImportedVariable, Mapping, MappingId, RefId, ReferenceVariable, Threshold,
};
use tracing::warn;

/// A valid mapping together with its classification against the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedMapping {
    pub mapping: Mapping,
    pub above_threshold: bool,
}

/// Which end of a dangling mapping failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSide {
    Import,
    Reference,
    Both,
}

/// Diagnostic for a mapping excluded from the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingMapping {
    pub mapping_id: MappingId,
    pub import_id: ImportId,
    pub ref_id: RefId,
    pub missing: MissingSide,
}

/// Row coordinates of a drawn link.
///
/// `import_row` indexes the import collection, `reference_row` indexes
/// [`ReconciledView::ordered_references`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub mapping_id: MappingId,
    pub import_row: usize,
    pub reference_row: usize,
    pub score: f64,
    pub above_threshold: bool,
}

/// Counts shown above the review surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub imports: usize,
    pub imports_with_mapping: usize,
    pub references_mapped: usize,
    pub references_unmapped: usize,
    pub valid_links: usize,
    pub links_above_threshold: usize,
    pub dangling: usize,
}

/// Output of [`derive_view`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledView {
    pub threshold: Threshold,
    /// Mappings whose import and reference both exist, in collection order.
    pub valid_mappings: Vec<ClassifiedMapping>,
    /// Best valid score per import. Imports without a valid mapping are absent.
    pub best_score_by_import: BTreeMap<ImportId, f64>,
    /// Mapped references first, then unmapped; each group in collection order.
    pub ordered_references: Vec<ReferenceVariable>,
    pub links: Vec<Link>,
    pub dangling: Vec<DanglingMapping>,
    summary: ReviewSummary,
}

impl ReconciledView {
    pub fn best_score(&self, import_id: &ImportId) -> Option<f64> {
        self.best_score_by_import.get(import_id).copied()
    }

    pub fn summary(&self) -> ReviewSummary {
        self.summary
    }

    pub fn mappings_for_import<'a>(
        &'a self,
        import_id: &'a ImportId,
    ) -> impl Iterator<Item = &'a ClassifiedMapping> + 'a {
        self.valid_mappings
            .iter()
            .filter(move |m| &m.mapping.import_id == import_id)
    }

    pub fn is_reference_mapped(&self, ref_id: &RefId) -> bool {
        self.ordered_references
            .iter()
            .take(self.summary.references_mapped)
            .any(|r| &r.ref_id == ref_id)
    }

    pub fn above_threshold(&self) -> impl Iterator<Item = &ClassifiedMapping> {
        self.valid_mappings.iter().filter(|m| m.above_threshold)
    }
}

/// Derive the review view from the current collections.
///
/// Never fails: a mapping pointing at a missing import or reference is
/// excluded, reported in [`ReconciledView::dangling`] and logged.
pub fn derive_view(
    references: &[ReferenceVariable],
    imports: &[ImportedVariable],
    mappings: &[Mapping],
    threshold: Threshold,
) -> ReconciledView {
    let import_index: HashMap<&ImportId, usize> = imports
        .iter()
        .enumerate()
        .map(|(idx, import)| (&import.import_id, idx))
        .collect();
    let ref_index: HashMap<&RefId, usize> = references
        .iter()
        .enumerate()
        .map(|(idx, reference)| (&reference.ref_id, idx))
        .collect();

    let mut valid: Vec<&Mapping> = Vec::with_capacity(mappings.len());
    let mut dangling = Vec::new();
    for mapping in mappings {
        let has_import = import_index.contains_key(&mapping.import_id);
        let has_ref = ref_index.contains_key(&mapping.ref_id);
        let missing = match (has_import, has_ref) {
            (true, true) => {
                valid.push(mapping);
                continue;
            }
            (false, true) => MissingSide::Import,
            (true, false) => MissingSide::Reference,
            (false, false) => MissingSide::Both,
        };
        warn!(
            mapping_id = %mapping.id,
            import_id = %mapping.import_id,
            ref_id = %mapping.ref_id,
            ?missing,
            "mapping ignored because it references missing entities"
        );
        dangling.push(DanglingMapping {
            mapping_id: mapping.id.clone(),
            import_id: mapping.import_id.clone(),
            ref_id: mapping.ref_id.clone(),
            missing,
        });
    }

    let mut best_score_by_import: BTreeMap<ImportId, f64> = BTreeMap::new();
    for mapping in &valid {
        best_score_by_import
            .entry(mapping.import_id.clone())
            .and_modify(|best| *best = best.max(mapping.score))
            .or_insert(mapping.score);
    }

    let mapped_refs: HashSet<&RefId> = valid.iter().map(|m| &m.ref_id).collect();
    let (mapped, unmapped): (Vec<&ReferenceVariable>, Vec<&ReferenceVariable>) = references
        .iter()
        .partition(|r| mapped_refs.contains(&r.ref_id));
    let references_mapped = mapped.len();
    let ordered_references: Vec<ReferenceVariable> =
        mapped.into_iter().chain(unmapped).cloned().collect();
    let ordered_index: HashMap<&RefId, usize> = ordered_references
        .iter()
        .enumerate()
        .map(|(idx, reference)| (&reference.ref_id, idx))
        .collect();

    let mut links = Vec::with_capacity(valid.len());
    let mut valid_mappings = Vec::with_capacity(valid.len());
    for mapping in valid {
        let above_threshold = threshold.classify(mapping.score);
        if let (Some(&import_row), Some(&reference_row)) = (
            import_index.get(&mapping.import_id),
            ordered_index.get(&mapping.ref_id),
        ) {
            links.push(Link {
                mapping_id: mapping.id.clone(),
                import_row,
                reference_row,
                score: mapping.score,
                above_threshold,
            });
        }
        valid_mappings.push(ClassifiedMapping {
            mapping: mapping.clone(),
            above_threshold,
        });
    }

    let summary = ReviewSummary {
        imports: imports.len(),
        imports_with_mapping: best_score_by_import.len(),
        references_mapped,
        references_unmapped: ordered_references.len() - references_mapped,
        valid_links: valid_mappings.len(),
        links_above_threshold: valid_mappings.iter().filter(|m| m.above_threshold).count(),
        dangling: dangling.len(),
    };

    ReconciledView {
        threshold,
        valid_mappings,
        best_score_by_import,
        ordered_references,
        links,
        dangling,
        summary,
    }
}
