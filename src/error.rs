//! Error type for corpus/model loading and driver configuration.
//!
//! Only recoverable failures live here. Broken invariants (out-of-range
//! topics, a cursor used past its end, a draw that selects nothing) panic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LdaError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in a corpus or model file.
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("line {line} exceeds the maximum length of {limit} bytes")]
    LineTooLong { line: usize, limit: usize },

    /// A corpus file in which no line yields a document.
    #[error("corpus {} contains no documents with at least 2 words", .0.display())]
    EmptyCorpus(std::path::PathBuf),

    /// A model file without any word lines.
    #[error("model file contains no word lines")]
    EmptyModel,

    /// Text that cannot become a document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Every problem found while validating a training configuration.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LdaError>;
