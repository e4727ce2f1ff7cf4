//! Remote gateway for the semantic schema mapper.
//!
//! The service extracts variables from uploaded files and scores imported
//! variables against the reference schema. This crate only speaks its
//! HTTP contract; the scoring itself lives in the service.

pub mod client;
pub mod error;
pub mod settings;
pub mod wire;
pub mod workflow;

pub use client::{GatewayClient, ScoringGateway};
pub use error::GatewayError;
pub use settings::{DEFAULT_BASE_URL, GatewaySettings};
pub use wire::ExtractedVariable;
pub use workflow::{
    AlignFailure, AlignOptions, AlignProgress, AlignReport, align_imports, ingest_upload,
    refresh_references, remap_import,
};
