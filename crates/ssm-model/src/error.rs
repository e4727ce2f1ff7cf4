use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),
    #[error("unknown tab index: {0}")]
    InvalidTab(usize),
    #[error("unknown import field: {0}")]
    UnknownField(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
