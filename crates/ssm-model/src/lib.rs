pub mod error;
pub mod ids;
pub mod import;
pub mod mapping;
pub mod reference;
pub mod review;

pub use error::{ModelError, Result};
pub use ids::{ImportId, MappingId, RefId};
pub use import::{ImportDraft, ImportField, ImportedVariable};
pub use mapping::{Mapping, MappingCandidate};
pub use reference::{ReferenceVariable, unique_values};
pub use review::{ActiveTab, Threshold};
