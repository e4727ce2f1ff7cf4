use std::sync::{Arc, Mutex};

use ssm_model::{
    ActiveTab, ImportDraft, ImportField, ImportId, Mapping, MappingCandidate, MappingId, RefId,
    ReferenceVariable, Threshold,
};
use ssm_review::{ReviewStore, StoreChange, ViewCache};

fn reference(id: &str) -> ReferenceVariable {
    ReferenceVariable::new(RefId::new(id).unwrap(), format!("{id} name"))
}

fn candidate(ref_id: &str, score: f64) -> MappingCandidate {
    MappingCandidate::new(RefId::new(ref_id).unwrap(), score)
}

#[test]
fn removing_an_import_keeps_its_mappings_but_hides_them() {
    let mut store = ReviewStore::new();
    store.set_references(vec![reference("r1"), reference("r2")]);
    let i1 = store.add_import(ImportDraft::new("SPAD"));
    store.attach_candidates(&i1, vec![candidate("r1", 0.8)]);

    assert_eq!(store.derive_view().valid_mappings.len(), 1);

    assert!(store.remove_import(&i1));

    assert_eq!(store.mappings().len(), 1, "mapping is not cascade-deleted");
    let view = store.derive_view();
    assert!(view.valid_mappings.is_empty());
    assert_eq!(view.dangling.len(), 1);
    assert_eq!(view.best_score(&i1), None);
}

#[test]
fn reloading_references_hides_mappings_to_vanished_references() {
    let mut store = ReviewStore::new();
    store.set_references(vec![reference("r1")]);
    let i1 = store.add_import(ImportDraft::new("VIGOUR"));
    store.attach_candidates(&i1, vec![candidate("r1", 0.9)]);

    store.set_references(vec![reference("r2")]);

    let view = store.derive_view();
    assert!(view.valid_mappings.is_empty());
    assert_eq!(view.ordered_references[0].ref_id.as_str(), "r2");
}

#[test]
fn update_of_unknown_import_is_a_noop() {
    let mut store = ReviewStore::new();
    let existing = store.add_import(ImportDraft::new("Leaf_Area"));
    let before = store.versions();

    let unknown = ImportId::new("missing").unwrap();
    assert!(!store.update_import(&unknown, ImportDraft::new("X")));
    assert!(!store.update_import_field(&unknown, ImportField::Unit, "cm"));
    assert_eq!(store.versions(), before);

    assert!(store.update_import(&existing, ImportDraft::new("Leaf_Area").with_description("Leaf area")));
    assert!(store.update_import_field(&existing, ImportField::Unit, "cm2"));
    let row = store.import(&existing).expect("row exists");
    assert_eq!(row.description, "Leaf area");
    assert_eq!(row.unit, "cm2");
    assert_eq!(row.import_id, existing);
}

#[test]
fn add_mappings_assigns_fresh_ids() {
    let mut store = ReviewStore::new();
    let import_id = ImportId::new("i1").unwrap();
    let mapping = Mapping {
        id: MappingId::new("client-side").unwrap(),
        ref_id: RefId::new("r1").unwrap(),
        import_id: import_id.clone(),
        score: 0.5,
        why_match: "unit match".to_string(),
    };

    let ids = store.add_mappings(vec![mapping.clone(), mapping]);

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(store.mappings().iter().all(|m| m.id.as_str() != "client-side"));
    assert_eq!(store.mappings()[0].why_match, "unit match");
}

#[test]
fn mapping_removal_operations() {
    let mut store = ReviewStore::new();
    let i1 = store.add_import(ImportDraft::new("A"));
    let i2 = store.add_import(ImportDraft::new("B"));
    let first = store.attach_candidates(&i1, vec![candidate("r1", 0.1), candidate("r2", 0.2)]);
    store.attach_candidates(&i2, vec![candidate("r1", 0.3)]);

    assert!(store.remove_mapping(&first[0]));
    assert!(!store.remove_mapping(&first[0]));
    assert_eq!(store.mappings().len(), 2);

    assert_eq!(store.remove_mappings_for_import(&i1), 1);
    assert_eq!(store.remove_mappings_for_import(&i1), 0);
    assert_eq!(store.mappings().len(), 1);
    assert_eq!(store.mappings()[0].import_id, i2);

    store.replace_mappings(Vec::new());
    assert!(store.mappings().is_empty());
}

#[test]
fn replace_imports_generates_new_ids() {
    let mut store = ReviewStore::new();
    let old = store.add_import(ImportDraft::new("OLD"));
    let ids = store.replace_imports(vec![ImportDraft::new("A"), ImportDraft::new("B")]);

    assert_eq!(ids.len(), 2);
    assert!(!store.has_import(&old));
    let traits: Vec<&str> = store.imports().iter().map(|i| i.trait_id.as_str()).collect();
    assert_eq!(traits, vec!["A", "B"]);
}

#[test]
fn duplicate_reference_ids_keep_first() {
    let mut store = ReviewStore::new();
    let mut duplicate = reference("r1");
    duplicate.name = "second".to_string();
    store.set_references(vec![reference("r1"), duplicate, reference("r2")]);

    assert_eq!(store.references().len(), 2);
    assert_eq!(store.references()[0].name, "r1 name");
}

#[test]
fn threshold_is_stored_unclamped_and_reclassifies() {
    let mut store = ReviewStore::new();
    store.set_references(vec![reference("r1")]);
    let i1 = store.add_import(ImportDraft::new("A"));
    store.attach_candidates(&i1, vec![candidate("r1", 0.8)]);

    store.set_threshold(Threshold::new(0.8));
    assert!(store.derive_view().valid_mappings[0].above_threshold);

    store.set_threshold(Threshold::new(0.8001));
    assert!(!store.derive_view().valid_mappings[0].above_threshold);

    store.set_threshold(Threshold::new(1.7));
    assert_eq!(store.threshold().value(), 1.7);
}

#[test]
fn subscribers_observe_every_mutation() {
    let mut store = ReviewStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    let id = store.add_import(ImportDraft::new("A"));
    store.set_active_tab(ActiveTab::Mapping);
    store.set_threshold(Threshold::new(0.5));
    assert!(store.unsubscribe(subscription));
    store.remove_import(&id);

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            StoreChange::ImportAdded(id),
            StoreChange::ActiveTabChanged(ActiveTab::Mapping),
            StoreChange::ThresholdChanged(Threshold::new(0.5)),
        ]
    );
    assert_eq!(store.active_tab(), ActiveTab::Mapping);
}

#[test]
fn view_cache_rebuilds_only_on_relevant_changes() {
    let mut store = ReviewStore::new();
    let mut cache = ViewCache::new();
    store.set_references(vec![reference("r1")]);

    cache.view(&store);
    cache.view(&store);
    assert_eq!(cache.rebuilds(), 1);

    store.set_active_tab(ActiveTab::Mapping);
    cache.view(&store);
    assert_eq!(cache.rebuilds(), 1);

    assert!(cache.is_fresh(&store));
    store.set_threshold(Threshold::new(0.9));
    assert!(!cache.is_fresh(&store));
    let view = cache.view(&store);
    assert_eq!(view.threshold, Threshold::new(0.9));
    assert_eq!(cache.rebuilds(), 2);

    cache.invalidate();
    assert!(!cache.is_fresh(&store));
}
