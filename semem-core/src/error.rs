//! Error kinds shared across the semem workspace.
//!
//! `semem-sparql` reuses this enum rather than defining its own — one
//! `Error` type threads through the core and the storage crate, matching how
//! `memory-core`'s `Error` is shared with its storage backends via `#[from]`.

/// Result type alias for semem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds for the semantic memory system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Argument shape/type is wrong, or a required argument is missing.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An embedding's length does not match the expected dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension for the configured model.
        expected: usize,
        /// Actual length of the supplied vector.
        actual: usize,
    },

    /// A vector contains a NaN or infinite element.
    #[error("invalid numeric value in vector")]
    InvalidNumeric,

    /// A SPARQL template is unknown, or a required placeholder is missing.
    #[error("template error: {0}")]
    TemplateError(String),

    /// A transient network condition (5xx, timeout, connection refused).
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The SPARQL endpoint rejected credentials (401/403).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The SPARQL endpoint returned a non-auth 4xx.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The SPARQL endpoint's response could not be parsed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A second transaction was opened while one was already active.
    #[error("transaction already in progress")]
    TransactionBusy,

    /// `begin()` found a stale backup graph from a previous, unfinished transaction.
    #[error("stale backup graph present: {0}")]
    StaleBackup(String),

    /// A persisted entry could not be parsed during `load_history`; it was skipped.
    #[error("corrupt entry skipped: {0}")]
    CorruptEntry(String),

    /// The external embedder failed after exhausting retries.
    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    /// The external concept extractor failed after exhausting retries.
    #[error("concept extraction failed: {0}")]
    ConceptExtractionFailed(String),

    /// A persistence step failed after a successful in-memory update.
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    /// An `augment` capability (summarize, relate, ...) failed after retries.
    #[error("enhancement failed: {0}")]
    EnhancementFailed(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation was cancelled before completion.
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the caller may retry the operation that produced this error.
    ///
    /// Pure in-memory errors are never retryable; network/external-capability
    /// errors are retryable only before they've been re-tagged into a
    /// terminal `*Failed` variant.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::TransientNetwork(_))
    }

    /// The abstract error kind name, as used in `{error: kind, ...}` verb responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ValidationError(_) => "ValidationError",
            Error::DimensionMismatch { .. } => "DimensionMismatch",
            Error::InvalidNumeric => "InvalidNumeric",
            Error::TemplateError(_) => "TemplateError",
            Error::TransientNetwork(_) => "TransientNetwork",
            Error::AuthFailed(_) => "AuthFailed",
            Error::BadRequest(_) => "BadRequest",
            Error::MalformedResponse(_) => "MalformedResponse",
            Error::TransactionBusy => "TransactionBusy",
            Error::StaleBackup(_) => "StaleBackup",
            Error::CorruptEntry(_) => "CorruptEntry",
            Error::EmbeddingFailed(_) => "EmbeddingFailed",
            Error::ConceptExtractionFailed(_) => "ConceptExtractionFailed",
            Error::PersistenceFailed(_) => "PersistenceFailed",
            Error::EnhancementFailed(_) => "EnhancementFailed",
            Error::NotFound(_) => "NotFound",
            Error::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_network_is_recoverable() {
        let err = Error::TransientNetwork("timeout".into());
        assert!(err.is_recoverable());
        assert_eq!(err.kind(), "TransientNetwork");
    }

    #[test]
    fn validation_is_not_recoverable() {
        let err = Error::ValidationError("missing field".into());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn auth_failed_is_not_recoverable() {
        assert!(!Error::AuthFailed("bad token".into()).is_recoverable());
    }
}
