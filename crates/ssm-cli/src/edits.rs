//! Scripted edits applied to the review between alignment and rendering.
//!
//! Rows are addressed by trait id; an edit applies to every row carrying
//! that id. Edits run in a fixed order: unlink, unmap, drop, then field
//! sets, so a `--set` that renames a trait id does not change which rows
//! the other edits address.

use std::str::FromStr;

use ssm_model::{ImportDraft, ImportField, ImportId, MappingId, RefId};
use ssm_review::ReviewStore;
use tracing::debug;

/// `TRAIT.FIELD=VALUE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub trait_id: String,
    pub field: ImportField,
    pub value: String,
}

impl FromStr for FieldEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TRAIT.FIELD=VALUE, got `{s}`"))?;
        let (trait_id, field) = target
            .rsplit_once('.')
            .ok_or_else(|| format!("expected TRAIT.FIELD before `=`, got `{target}`"))?;
        let trait_id = trait_id.trim();
        if trait_id.is_empty() {
            return Err(format!("missing trait id in `{s}`"));
        }
        let field = field.parse::<ImportField>().map_err(|e| e.to_string())?;
        Ok(Self {
            trait_id: trait_id.to_string(),
            field,
            value: value.to_string(),
        })
    }
}

/// `TRAIT=REF_ID`: one link to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdit {
    pub trait_id: String,
    pub ref_id: RefId,
}

impl FromStr for LinkEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (trait_id, ref_id) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TRAIT=REF_ID, got `{s}`"))?;
        let trait_id = trait_id.trim();
        if trait_id.is_empty() {
            return Err(format!("missing trait id in `{s}`"));
        }
        let ref_id = RefId::new(ref_id).map_err(|e| e.to_string())?;
        Ok(Self {
            trait_id: trait_id.to_string(),
            ref_id,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewEdits {
    /// Blank rows added after upload, so they are aligned with the rest.
    pub add_rows: Vec<String>,
    pub set: Vec<FieldEdit>,
    pub unlink: Vec<LinkEdit>,
    /// Remove every mapping of these rows.
    pub unmap: Vec<String>,
    pub drop_rows: Vec<String>,
}

/// What [`ReviewEdits::apply`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    pub rows_updated: usize,
    pub rows_removed: usize,
    pub mappings_removed: usize,
    /// Trait ids that matched no row.
    pub unmatched: Vec<String>,
}

impl ReviewEdits {
    pub fn is_empty(&self) -> bool {
        self.add_rows.is_empty()
            && self.set.is_empty()
            && self.unlink.is_empty()
            && self.unmap.is_empty()
            && self.drop_rows.is_empty()
    }

    pub fn add_rows(&self, store: &mut ReviewStore, dataset_id: &str) -> Vec<ImportId> {
        self.add_rows
            .iter()
            .map(|trait_id| {
                store.add_import(ImportDraft::new(trait_id.trim()).with_dataset(dataset_id))
            })
            .collect()
    }

    pub fn apply(&self, store: &mut ReviewStore) -> EditReport {
        let mut report = EditReport::default();

        for edit in &self.unlink {
            let Some(rows) = matching_rows(store, &edit.trait_id, &mut report) else {
                continue;
            };
            let doomed: Vec<MappingId> = store
                .mappings()
                .iter()
                .filter(|m| m.ref_id == edit.ref_id && rows.contains(&m.import_id))
                .map(|m| m.id.clone())
                .collect();
            for id in &doomed {
                if store.remove_mapping(id) {
                    report.mappings_removed += 1;
                }
            }
        }

        for trait_id in &self.unmap {
            let Some(rows) = matching_rows(store, trait_id, &mut report) else {
                continue;
            };
            for row in &rows {
                report.mappings_removed += store.remove_mappings_for_import(row);
            }
        }

        for trait_id in &self.drop_rows {
            let Some(rows) = matching_rows(store, trait_id, &mut report) else {
                continue;
            };
            for row in &rows {
                if store.remove_import(row) {
                    report.rows_removed += 1;
                }
            }
        }

        for edit in &self.set {
            let Some(rows) = matching_rows(store, &edit.trait_id, &mut report) else {
                continue;
            };
            for row in &rows {
                if store.update_import_field(row, edit.field, edit.value.clone()) {
                    report.rows_updated += 1;
                }
            }
        }

        debug!(?report, "review edits applied");
        report
    }
}

fn matching_rows(
    store: &ReviewStore,
    trait_id: &str,
    report: &mut EditReport,
) -> Option<Vec<ImportId>> {
    let trait_id = trait_id.trim();
    let rows: Vec<ImportId> = store
        .imports()
        .iter()
        .filter(|row| row.trait_id == trait_id)
        .map(|row| row.import_id.clone())
        .collect();
    if rows.is_empty() {
        if !report.unmatched.iter().any(|t| t == trait_id) {
            report.unmatched.push(trait_id.to_string());
        }
        return None;
    }
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_edit_parses_trait_with_dots() {
        let edit: FieldEdit = "LEAF.AREA.unit=cm2".parse().unwrap();
        assert_eq!(edit.trait_id, "LEAF.AREA");
        assert_eq!(edit.field, ImportField::Unit);
        assert_eq!(edit.value, "cm2");

        let blank: FieldEdit = "SPAD.description=".parse().unwrap();
        assert_eq!(blank.value, "");
    }

    #[test]
    fn malformed_edits_are_rejected() {
        assert!("SPAD=1".parse::<FieldEdit>().is_err());
        assert!("SPAD.colour=red".parse::<FieldEdit>().is_err());
        assert!(".unit=cm".parse::<FieldEdit>().is_err());
        assert!("SPAD".parse::<LinkEdit>().is_err());
        assert!("SPAD= ".parse::<LinkEdit>().is_err());
        assert_eq!(
            "SPAD=r1".parse::<LinkEdit>().unwrap().ref_id,
            RefId::new("r1").unwrap()
        );
    }
}
