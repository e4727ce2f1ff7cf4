use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::RefId;

/// A canonical variable from the curated reference schema.
///
/// Reference variables are never edited locally. A reload from the remote
/// schema replaces the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceVariable {
    pub ref_id: RefId,
    pub name: String,
    /// Accepted units, de-duplicated in first-seen order.
    #[serde(default)]
    pub units: Vec<String>,
    /// Accepted measurement methods, de-duplicated in first-seen order.
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ReferenceVariable {
    pub fn new(ref_id: RefId, name: impl Into<String>) -> Self {
        Self {
            ref_id,
            name: name.into(),
            units: Vec::new(),
            methods: Vec::new(),
            description: String::new(),
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units = unique_values(units);
        self
    }

    #[must_use]
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = unique_values(methods);
        self
    }

    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = unique_values(aliases);
        self
    }

    /// Label shown in listings; falls back to the id when the name is blank.
    pub fn display_label(&self) -> &str {
        if self.name.trim().is_empty() {
            self.ref_id.as_str()
        } else {
            &self.name
        }
    }
}

/// Collect values into a set-like list: blanks dropped, duplicates removed,
/// first occurrence kept.
pub fn unique_values<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(Into::into)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
