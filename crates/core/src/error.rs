//! Error types for ragdesk.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! ingestion, indexing, embedding and generation failures. Every variant
//! maps to a stable kind string (see [`AppError::kind`]) so callers can tell
//! failures apart without matching on messages.

use thiserror::Error;

/// Unified error type for ragdesk.
///
/// All fallible functions return `Result<T, AppError>`. The type is `Clone`
/// so that a single index-construction failure can be handed to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(String),

    /// File extension is not one of the supported document formats
    #[error("Unsupported file type for '{0}'. Only PDF, TXT and MD are allowed")]
    UnsupportedFormat(String),

    /// Text could not be extracted from a document
    #[error("Failed to extract text from '{filename}': {reason}")]
    Extraction { filename: String, reason: String },

    /// Index construction was attempted with no chunks
    #[error("No documents available, cannot build the index")]
    EmptyCorpus,

    /// A document with this filename is already indexed (or being indexed)
    #[error("A file named '{0}' already exists in the knowledge base")]
    DuplicateFilename(String),

    /// The index has not finished initializing
    #[error("Index is still initializing")]
    NotReady,

    /// Index initialization failed; the service needs a restart
    #[error("Index initialization failed: {0}")]
    IndexFailed(Box<AppError>),

    /// Embedding provider errors (including timeouts)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Generation model errors (including timeouts)
    #[error("Generation error: {0}")]
    Generation(String),

    /// A running operation was abandoned before it finished
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Caller passed an argument outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A vector did not have the index's dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Build an extraction error for a file.
    pub fn extraction(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Extraction { .. } => "extraction_error",
            Self::EmptyCorpus => "empty_corpus",
            Self::DuplicateFilename(_) => "duplicate_filename",
            Self::NotReady => "not_ready",
            Self::IndexFailed(_) => "index_failed",
            Self::Embedding(_) => "embedding_error",
            Self::Generation(_) => "generation_error",
            Self::Cancelled(_) => "cancelled",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::Prompt(_) => "prompt",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct_for_caller_visible_errors() {
        let errors = [
            AppError::UnsupportedFormat("a.docx".to_string()),
            AppError::extraction("a.pdf", "corrupt"),
            AppError::EmptyCorpus,
            AppError::DuplicateFilename("a.txt".to_string()),
            AppError::NotReady,
            AppError::IndexFailed(Box::new(AppError::EmptyCorpus)),
            AppError::Embedding("timeout".to_string()),
            AppError::Generation("timeout".to_string()),
        ];

        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_index_failed_keeps_cause_in_message() {
        let err = AppError::IndexFailed(Box::new(AppError::EmptyCorpus));
        assert!(err.to_string().contains("No documents available"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("missing"));
    }
}
