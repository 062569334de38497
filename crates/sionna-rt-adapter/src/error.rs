//! Error types shared by the model, the driver and the result extractor

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The aggregate was serialized without passing validation first
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A results directory or input file the operation depends on is absent
    #[error("Missing {what}: {path:?}")]
    MissingResource { what: &'static str, path: PathBuf },

    #[error("Invalid tree path: {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// An edit event carried a value of the wrong kind for the target adapter
    #[error("Field '{field}' expects a {expected} value")]
    ValueMismatch { field: String, expected: &'static str },

    #[error("Geometry {0} cannot be added here")]
    GeometryRejected(String),

    #[error("Invalid summary: {0}")]
    InvalidSummary(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

/// A recoverable, user-visible validation message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Prefix the message with the label of the enclosing composite
    pub fn prefixed(self, label: &str) -> Self {
        Self(format!("{}{}", label, self.0))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
