//! Review session tests with an in-memory gateway.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ssm_cli::edits::ReviewEdits;
use ssm_cli::session::run_review_session;
use ssm_gateway::{AlignOptions, ExtractedVariable, GatewayError, ScoringGateway};
use ssm_model::{
    ActiveTab, ImportField, ImportedVariable, MappingCandidate, RefId, ReferenceVariable,
};
use ssm_review::{ReviewStore, lock_store};

#[derive(Default)]
struct FakeGateway {
    references: Option<Vec<ReferenceVariable>>,
    extracted: Option<Vec<ExtractedVariable>>,
    candidates: HashMap<String, Vec<MappingCandidate>>,
}

fn status_error(path: &str) -> GatewayError {
    GatewayError::Status {
        url: format!("http://stub{path}"),
        status: 503,
        body: "unavailable".to_string(),
    }
}

impl ScoringGateway for FakeGateway {
    async fn load_references(&self) -> Result<Vec<ReferenceVariable>, GatewayError> {
        self.references.clone().ok_or_else(|| status_error("/core"))
    }

    async fn upload_file(&self, _path: &Path) -> Result<Vec<ExtractedVariable>, GatewayError> {
        self.extracted
            .clone()
            .ok_or_else(|| status_error("/uploadfile"))
    }

    async fn get_mapping(
        &self,
        variable: &ImportedVariable,
    ) -> Result<Vec<MappingCandidate>, GatewayError> {
        Ok(self
            .candidates
            .get(&variable.trait_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn reference(id: &str) -> ReferenceVariable {
    ReferenceVariable::new(RefId::new(id).unwrap(), id)
}

fn candidate(ref_id: &str, score: f64) -> MappingCandidate {
    MappingCandidate::new(RefId::new(ref_id).unwrap(), score)
}

fn extracted(trait_id: &str) -> ExtractedVariable {
    ExtractedVariable {
        trait_id: trait_id.to_string(),
        ..ExtractedVariable::default()
    }
}

fn gateway() -> FakeGateway {
    let mut candidates = HashMap::new();
    candidates.insert("SPAD".to_string(), vec![candidate("r1", 0.9), candidate("r2", 0.3)]);
    candidates.insert("VIGOUR".to_string(), vec![candidate("r2", 0.7)]);
    candidates.insert("LEAF".to_string(), vec![candidate("r3", 0.6)]);
    FakeGateway {
        references: Some(vec![reference("r1"), reference("r2"), reference("r3")]),
        extracted: Some(vec![extracted("SPAD"), extracted("VIGOUR")]),
        candidates,
    }
}

fn trial_file() -> PathBuf {
    PathBuf::from("/data/trial.xlsx")
}

#[tokio::test]
async fn clean_run_ends_on_mapping_tab() {
    let store = ReviewStore::shared();

    let outcome = run_review_session(
        &gateway(),
        &store,
        &trial_file(),
        AlignOptions::default(),
        &ReviewEdits::default(),
        |_| {},
    )
    .await
    .unwrap();

    assert!(!outcome.has_errors());
    assert_eq!(outcome.align.attached, 3);
    let guard = lock_store(&store);
    assert_eq!(guard.active_tab(), ActiveTab::Mapping);
    assert_eq!(guard.derive_view().summary().valid_links, 3);
}

#[tokio::test]
async fn reference_failure_still_aligns_imports() {
    let gateway = FakeGateway {
        references: None,
        ..gateway()
    };
    let store = ReviewStore::shared();
    let mut progress = Vec::new();

    let outcome = run_review_session(
        &gateway,
        &store,
        &trial_file(),
        AlignOptions::default(),
        &ReviewEdits::default(),
        |p| progress.push(p.completed),
    )
    .await
    .unwrap();

    assert!(outcome.has_errors());
    assert!(matches!(
        outcome.references_error,
        Some(GatewayError::Status { status: 503, .. })
    ));
    assert!(outcome.align.is_complete());
    assert_eq!(progress, vec![1, 2]);

    let guard = lock_store(&store);
    assert_eq!(guard.imports().len(), 2);
    assert_eq!(guard.mappings().len(), 3);
    let view = guard.derive_view();
    assert!(view.ordered_references.is_empty());
    assert!(view.links.is_empty());
    assert_eq!(view.summary().dangling, 3);
    assert_eq!(guard.active_tab(), ActiveTab::Mapping);
}

#[tokio::test]
async fn upload_failure_ends_the_run() {
    let gateway = FakeGateway {
        extracted: None,
        ..gateway()
    };
    let store = ReviewStore::shared();

    let error = run_review_session(
        &gateway,
        &store,
        &trial_file(),
        AlignOptions::default(),
        &ReviewEdits::default(),
        |_| {},
    )
    .await
    .unwrap_err();

    assert!(matches!(error, GatewayError::Status { status: 503, .. }));
    let guard = lock_store(&store);
    assert_eq!(guard.references().len(), 3);
    assert!(guard.imports().is_empty());
    assert!(guard.mappings().is_empty());
}

#[tokio::test]
async fn added_rows_are_aligned_with_the_upload() {
    let edits = ReviewEdits {
        add_rows: vec!["LEAF".to_string()],
        ..ReviewEdits::default()
    };
    let store = ReviewStore::shared();

    let outcome = run_review_session(
        &gateway(),
        &store,
        &trial_file(),
        AlignOptions::default(),
        &edits,
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.align.requested, 3);
    let guard = lock_store(&store);
    let leaf = guard
        .imports()
        .iter()
        .find(|row| row.trait_id == "LEAF")
        .unwrap();
    assert_eq!(leaf.dataset_id, "trial.xlsx");
    let view = guard.derive_view();
    assert_eq!(view.best_score(&leaf.import_id), Some(0.6));
}

#[tokio::test]
async fn edits_update_unlink_unmap_and_drop_rows() {
    let edits = ReviewEdits {
        set: vec!["VIGOUR.unit=score 1-9".parse().unwrap()],
        unlink: vec!["SPAD=r2".parse().unwrap()],
        unmap: vec!["VIGOUR".to_string()],
        drop_rows: vec!["LEAF".to_string(), "MISSING".to_string()],
        add_rows: vec!["LEAF".to_string()],
    };
    let store = ReviewStore::shared();

    let outcome = run_review_session(
        &gateway(),
        &store,
        &trial_file(),
        AlignOptions::default(),
        &edits,
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.edits.mappings_removed, 2);
    assert_eq!(outcome.edits.rows_removed, 1);
    assert_eq!(outcome.edits.rows_updated, 1);
    assert_eq!(outcome.edits.unmatched, vec!["MISSING".to_string()]);
    assert!(!outcome.has_errors());

    let guard = lock_store(&store);
    let traits: Vec<&str> = guard.imports().iter().map(|r| r.trait_id.as_str()).collect();
    assert_eq!(traits, vec!["SPAD", "VIGOUR"]);
    let vigour = &guard.imports()[1];
    assert_eq!(vigour.field(ImportField::Unit), "score 1-9");

    // SPAD keeps r1; the dropped LEAF row leaves its r3 mapping behind.
    let view = guard.derive_view();
    let spad = &guard.imports()[0];
    let kept: Vec<&str> = view
        .mappings_for_import(&spad.import_id)
        .map(|m| m.mapping.ref_id.as_str())
        .collect();
    assert_eq!(kept, vec!["r1"]);
    assert_eq!(view.mappings_for_import(&vigour.import_id).count(), 0);
    assert_eq!(guard.mappings().len(), 2);
    assert_eq!(view.summary().dangling, 1);
}

#[tokio::test]
async fn set_renaming_a_trait_does_not_retarget_other_edits() {
    let edits = ReviewEdits {
        set: vec!["SPAD.trait_id=VIGOUR".parse().unwrap()],
        unmap: vec!["VIGOUR".to_string()],
        ..ReviewEdits::default()
    };
    let store = ReviewStore::shared();

    let outcome = run_review_session(
        &gateway(),
        &store,
        &trial_file(),
        AlignOptions::default(),
        &edits,
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(outcome.edits.mappings_removed, 1);
    let guard = lock_store(&store);
    let view = guard.derive_view();
    let renamed = &guard.imports()[0];
    assert_eq!(renamed.trait_id, "VIGOUR");
    assert_eq!(view.mappings_for_import(&renamed.import_id).count(), 2);
}
