//! Error types for the report pipeline

use thiserror::Error;

/// Errors that can occur while loading input or building a yearly report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing input for year {year}: {source_name}")]
    MissingInput { year: i32, source_name: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(String),
}
