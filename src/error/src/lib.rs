//! Shared error types for the achievement tracker.
//!
//! One enum covers the whole error taxonomy: definition errors (malformed
//! threshold tables), usage errors (missing id, negative delta), integrity
//! errors (tamper detection, decryption failure) and storage errors.
//! Authorization failures are deliberately *not* errors: the manager logs
//! them and skips the mutation.

use thiserror::Error;

/// Errors surfaced by the achievement tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Malformed achievement definition (threshold table, parallel
    /// sequences, colors, or out-of-range restored state).
    #[error("invalid achievement definition: {0}")]
    InvalidDefinition(String),

    /// An operation was called without an achievement identifier.
    #[error("achievement identifier must be provided")]
    MissingId,

    /// Progress deltas must be finite and non-negative.
    #[error("progress delta must be a non-negative number, got {0}")]
    InvalidDelta(f64),

    /// The stored digest does not match the decrypted plaintext.
    #[error("data integrity check failed; achievement data may have been tampered with")]
    IntegrityCheckFailed,

    /// The stored ciphertext could not be decrypted.
    #[error("failed to decrypt stored achievement data")]
    DecryptFailed,

    /// The stored value does not have the expected shape.
    #[error("malformed stored achievement data: {0}")]
    MalformedData(String),

    /// Underlying key-value store failure.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// IO failure while reading or writing persisted state.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// (De)serialization of the plaintext collection failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}
