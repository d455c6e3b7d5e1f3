//! Error types for the compliance service

use thiserror::Error;

/// Errors raised by the service's collaborators.
///
/// These never cross the public [`ComplianceService`](crate::ComplianceService)
/// boundary; the service translates them into safe results there.
#[derive(Error, Debug)]
pub enum ComplianceError {
    /// Persistence layer failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Sanctions screening provider failure
    #[error("Sanctions provider error: {0}")]
    Provider(String),

    /// Audit log failure
    #[error("Audit log error: {0}")]
    Audit(String),

    /// Audit hash chain does not verify
    #[error("Audit integrity check failed: {0}")]
    IntegrityFailure(String),

    /// PII encryption or decryption failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Sanctions list not loaded
    #[error("Sanctions list not loaded: {0}")]
    ListNotLoaded(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration failure
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for compliance operations
pub type Result<T> = std::result::Result<T, ComplianceError>;
