//! Review workflows that combine gateway calls with store updates.
//!
//! The store lock is taken only around each store operation, never across
//! a request, so other commands may interleave with an in-flight call.
//! Results are applied when they arrive; the last write wins per
//! collection.

use std::path::Path;

use ssm_model::{ImportId, ImportedVariable};
use ssm_review::{SharedStore, lock_store};
use tracing::{debug, info, warn};

use crate::client::ScoringGateway;
use crate::error::GatewayError;

/// Load the reference schema and replace the store's references.
pub async fn refresh_references<G: ScoringGateway>(
    gateway: &G,
    store: &SharedStore,
) -> Result<usize, GatewayError> {
    let references = gateway.load_references().await?;
    let count = references.len();
    lock_store(store).set_references(references);
    Ok(count)
}

/// Upload a dataset file and replace the import rows with the extracted
/// variables. The file name becomes each row's dataset id.
pub async fn ingest_upload<G: ScoringGateway>(
    gateway: &G,
    store: &SharedStore,
    path: &Path,
) -> Result<Vec<ImportId>, GatewayError> {
    let variables = gateway.upload_file(path).await?;
    let dataset_id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let drafts = variables
        .into_iter()
        .map(|variable| variable.into_draft(dataset_id.clone()))
        .collect();
    let ids = lock_store(store).replace_imports(drafts);
    info!(rows = ids.len(), dataset = %dataset_id, "import rows replaced");
    Ok(ids)
}

/// Options for [`align_imports`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignOptions {
    /// Discard results for imports deleted while their request was in
    /// flight. When off, such results are appended and later filtered out
    /// as dangling.
    pub drop_stale: bool,
}

/// Progress after each processed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignProgress {
    pub completed: usize,
    pub total: usize,
    pub label: String,
}

#[derive(Debug)]
pub struct AlignFailure {
    pub import_id: ImportId,
    pub label: String,
    pub error: GatewayError,
}

/// Outcome of one [`align_imports`] run.
#[derive(Debug, Default)]
pub struct AlignReport {
    pub requested: usize,
    pub attached: usize,
    pub discarded_stale: usize,
    pub failures: Vec<AlignFailure>,
}

impl AlignReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch candidates for every import, one request at a time in row order.
///
/// The import list is snapshotted up front. A failed request is recorded
/// and the run moves on to the next row.
pub async fn align_imports<G, F>(
    gateway: &G,
    store: &SharedStore,
    options: AlignOptions,
    mut on_progress: F,
) -> AlignReport
where
    G: ScoringGateway,
    F: FnMut(&AlignProgress),
{
    let rows: Vec<ImportedVariable> = lock_store(store).imports().to_vec();
    let total = rows.len();
    let mut report = AlignReport::default();

    for (idx, row) in rows.into_iter().enumerate() {
        let label = row.display_label().to_string();
        debug!(import_id = %row.import_id, %label, "loading mappings");
        report.requested += 1;

        match gateway.get_mapping(&row).await {
            Ok(candidates) => {
                let mut guard = lock_store(store);
                if options.drop_stale && !guard.has_import(&row.import_id) {
                    debug!(import_id = %row.import_id, "import removed while in flight; results dropped");
                    report.discarded_stale += candidates.len();
                } else {
                    report.attached += guard.attach_candidates(&row.import_id, candidates).len();
                }
            }
            Err(error) => {
                warn!(import_id = %row.import_id, %label, %error, "mapping request failed");
                report.failures.push(AlignFailure {
                    import_id: row.import_id.clone(),
                    label: label.clone(),
                    error,
                });
            }
        }

        on_progress(&AlignProgress {
            completed: idx + 1,
            total,
            label,
        });
    }

    info!(
        requested = report.requested,
        attached = report.attached,
        failed = report.failures.len(),
        "alignment finished"
    );
    report
}

/// Replace one import's mappings with fresh candidates.
///
/// Existing mappings are kept if the request fails. Returns `Ok(None)` when
/// the import does not exist.
pub async fn remap_import<G: ScoringGateway>(
    gateway: &G,
    store: &SharedStore,
    import_id: &ImportId,
) -> Result<Option<usize>, GatewayError> {
    let Some(row) = lock_store(store).import(import_id).cloned() else {
        return Ok(None);
    };
    let candidates = gateway.get_mapping(&row).await?;
    let mut guard = lock_store(store);
    let removed = guard.remove_mappings_for_import(import_id);
    let attached = guard.attach_candidates(import_id, candidates).len();
    debug!(%import_id, removed, attached, "import remapped");
    Ok(Some(attached))
}
