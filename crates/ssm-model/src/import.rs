//! Imported variable rows.
//!
//! Rows come from the extraction service (one row per extracted variable) or
//! from a manual "add row" in the definitions table. The store owns them;
//! mappings only point at them by [`ImportId`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::ids::ImportId;

/// A variable extracted from a user dataset, pending classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedVariable {
    pub import_id: ImportId,
    pub dataset_id: String,
    pub trait_id: String,
    pub description: String,
    pub method: String,
    pub unit: String,
    /// Free-form trait label proposed by the extractor.
    pub trait_label: String,
}

impl ImportedVariable {
    pub fn from_draft(import_id: ImportId, draft: ImportDraft) -> Self {
        Self {
            import_id,
            dataset_id: draft.dataset_id,
            trait_id: draft.trait_id,
            description: draft.description,
            method: draft.method,
            unit: draft.unit,
            trait_label: draft.trait_label,
        }
    }

    /// Label shown on the import pill: the trait id, or the row id when the
    /// trait id has not been filled in yet.
    pub fn display_label(&self) -> &str {
        if self.trait_id.is_empty() {
            self.import_id.as_str()
        } else {
            &self.trait_id
        }
    }

    pub fn field(&self, field: ImportField) -> &str {
        match field {
            ImportField::DatasetId => &self.dataset_id,
            ImportField::TraitId => &self.trait_id,
            ImportField::Description => &self.description,
            ImportField::Method => &self.method,
            ImportField::Unit => &self.unit,
            ImportField::TraitLabel => &self.trait_label,
        }
    }

    pub fn set_field(&mut self, field: ImportField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ImportField::DatasetId => self.dataset_id = value,
            ImportField::TraitId => self.trait_id = value,
            ImportField::Description => self.description = value,
            ImportField::Method => self.method = value,
            ImportField::Unit => self.unit = value,
            ImportField::TraitLabel => self.trait_label = value,
        }
    }
}

/// The editable content of an imported variable row.
///
/// Every field accepts free text; nothing is validated at this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDraft {
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default)]
    pub trait_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub trait_label: String,
}

impl ImportDraft {
    pub fn new(trait_id: impl Into<String>) -> Self {
        Self {
            trait_id: trait_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = dataset_id.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Columns of the variable definitions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportField {
    DatasetId,
    TraitId,
    Description,
    Method,
    Unit,
    TraitLabel,
}

impl ImportField {
    pub const ALL: [ImportField; 6] = [
        ImportField::DatasetId,
        ImportField::TraitId,
        ImportField::Description,
        ImportField::Method,
        ImportField::Unit,
        ImportField::TraitLabel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportField::DatasetId => "dataset_id",
            ImportField::TraitId => "trait_id",
            ImportField::Description => "description",
            ImportField::Method => "method",
            ImportField::Unit => "unit",
            ImportField::TraitLabel => "trait",
        }
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "dataset_id" | "dataset" => Ok(ImportField::DatasetId),
            "trait_id" => Ok(ImportField::TraitId),
            "description" => Ok(ImportField::Description),
            "method" => Ok(ImportField::Method),
            "unit" | "units" => Ok(ImportField::Unit),
            "trait" | "trait_label" => Ok(ImportField::TraitLabel),
            _ => Err(ModelError::UnknownField(s.to_string())),
        }
    }
}
