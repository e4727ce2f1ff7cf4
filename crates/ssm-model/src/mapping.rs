use serde::{Deserialize, Serialize};

use crate::ids::{ImportId, MappingId, RefId};

/// A scored candidate link between one imported variable and one reference
/// variable.
///
/// Both ends are held by id only. Either entity may disappear from the store
/// while the mapping stays; such a mapping is dangling and is skipped by
/// every derived view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: MappingId,
    pub ref_id: RefId,
    pub import_id: ImportId,
    /// Similarity score in [0, 1] as returned by the scoring service.
    pub score: f64,
    /// Free-text explanation of the match.
    #[serde(default)]
    pub why_match: String,
}

/// A match candidate returned by the scoring service for one import.
///
/// Candidates carry no import id and no mapping id; the caller attaches both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingCandidate {
    pub ref_id: RefId,
    pub score: f64,
    #[serde(default)]
    pub why_match: String,
}

impl MappingCandidate {
    pub fn new(ref_id: RefId, score: f64) -> Self {
        Self {
            ref_id,
            score,
            why_match: String::new(),
        }
    }

    #[must_use]
    pub fn with_reason(mut self, why_match: impl Into<String>) -> Self {
        self.why_match = why_match.into();
        self
    }

    /// Bind the candidate to the import it was requested for, under a fresh
    /// mapping id.
    pub fn attach(self, import_id: ImportId) -> Mapping {
        Mapping {
            id: MappingId::generate(),
            ref_id: self.ref_id,
            import_id,
            score: self.score,
            why_match: self.why_match,
        }
    }
}
