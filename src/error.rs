//! Hermod error types

use tonic::Code;

use crate::status;

/// Hermod error types
#[derive(Debug, thiserror::Error)]
pub enum HermodError {
    /// An RPC completed with a non-OK status.
    #[error("rpc failed ({code:?}): {message}")]
    Status { code: Code, message: String },

    // Connection/channel establishment errors
    #[error("transport error: {0}")]
    Transport(String),

    /// Certificate or key material could not be read. Fatal for a
    /// TLS-enabled endpoint; there is no plaintext fallback.
    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Synthetic failure emitted by the backoff loop once its retry
    /// budget is spent. Distinct from the original cause.
    #[error("{operation} aborted after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },
}

impl HermodError {
    /// Status code carried by this error, if it came from an RPC.
    pub fn code(&self) -> Option<Code> {
        match self {
            HermodError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the backoff loop should retry after this error.
    ///
    /// Only transient RPC status codes qualify; transport and
    /// certificate failures are handled at connection establishment,
    /// not by the per-call loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            HermodError::Status { code, .. } => status::is_retryable(*code),
            _ => false,
        }
    }
}

impl From<tonic::Status> for HermodError {
    fn from(status: tonic::Status) -> Self {
        HermodError::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

/// Result type alias for Hermod operations
pub type Result<T> = std::result::Result<T, HermodError>;
