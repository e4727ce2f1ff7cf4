//! CLI library components for the schema mapper.

pub mod config;
pub mod edits;
pub mod logging;
pub mod render;
pub mod session;
