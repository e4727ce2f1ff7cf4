//! One review run: load references, ingest the file, align, apply edits.
//!
//! A failed reference load only empties the reference panel; the upload
//! and alignment still run. A failed upload ends the run, since there is
//! nothing to align.

use std::path::Path;

use ssm_gateway::{
    AlignOptions, AlignProgress, AlignReport, GatewayError, ScoringGateway, align_imports,
    ingest_upload, refresh_references,
};
use ssm_model::ActiveTab;
use ssm_review::{SharedStore, lock_store};
use tracing::{info, instrument, warn};

use crate::edits::{EditReport, ReviewEdits};

/// Result of a review run, used for the exit code.
#[derive(Debug, Default)]
pub struct ReviewOutcome {
    pub references_error: Option<GatewayError>,
    pub align: AlignReport,
    pub edits: EditReport,
}

impl ReviewOutcome {
    pub fn has_errors(&self) -> bool {
        self.references_error.is_some() || !self.align.is_complete()
    }
}

#[instrument(skip_all, fields(file = %file.display()))]
pub async fn run_review_session<G, F>(
    gateway: &G,
    store: &SharedStore,
    file: &Path,
    options: AlignOptions,
    edits: &ReviewEdits,
    on_progress: F,
) -> Result<ReviewOutcome, GatewayError>
where
    G: ScoringGateway,
    F: FnMut(&AlignProgress),
{
    lock_store(store).set_active_tab(ActiveTab::Ingestion);
    let mut outcome = ReviewOutcome::default();

    if let Err(error) = refresh_references(gateway, store).await {
        warn!(%error, "reference schema unavailable; continuing without it");
        outcome.references_error = Some(error);
    }

    ingest_upload(gateway, store, file).await?;
    if !edits.add_rows.is_empty() {
        let dataset_id = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let added = edits.add_rows(&mut lock_store(store), &dataset_id);
        info!(rows = added.len(), "rows added");
    }

    outcome.align = align_imports(gateway, store, options, on_progress).await;
    for failure in &outcome.align.failures {
        warn!(label = %failure.label, error = %failure.error, "variable not aligned");
    }

    let mut guard = lock_store(store);
    if !edits.is_empty() {
        outcome.edits = edits.apply(&mut guard);
        for trait_id in &outcome.edits.unmatched {
            warn!(%trait_id, "edit matched no row");
        }
    }
    guard.set_active_tab(ActiveTab::Mapping);
    Ok(outcome)
}
