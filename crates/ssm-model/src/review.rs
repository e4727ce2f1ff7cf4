//! Review parameters: the score threshold and the active workflow tab.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Minimum score treated as an above-confidence match.
///
/// The threshold only drives classification and display; it never decides
/// which mappings exist. No clamping happens here: callers that take user
/// input should go through [`Threshold::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: f64 = 0.65;

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Constrain a user-supplied value to [0, 1]. NaN becomes the default.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Inclusive lower bound: a score equal to the threshold is above it.
    pub fn classify(self, score: f64) -> bool {
        score >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// The three positions of the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTab {
    #[default]
    Ingestion,
    Mapping,
    /// Reserved; no units alignment exists yet.
    UnitsAlignment,
}

impl ActiveTab {
    pub fn from_index(index: usize) -> Result<Self, ModelError> {
        match index {
            0 => Ok(ActiveTab::Ingestion),
            1 => Ok(ActiveTab::Mapping),
            2 => Ok(ActiveTab::UnitsAlignment),
            other => Err(ModelError::InvalidTab(other)),
        }
    }

    pub fn index(self) -> usize {
        match self {
            ActiveTab::Ingestion => 0,
            ActiveTab::Mapping => 1,
            ActiveTab::UnitsAlignment => 2,
        }
    }

    pub fn is_available(self) -> bool {
        !matches!(self, ActiveTab::UnitsAlignment)
    }

    pub fn title(self) -> &'static str {
        match self {
            ActiveTab::Ingestion => "Data Ingestion",
            ActiveTab::Mapping => "Semantic Mapping",
            ActiveTab::UnitsAlignment => "Units Alignment",
        }
    }
}

impl fmt::Display for ActiveTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
