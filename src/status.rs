//! Status code taxonomy: human-readable descriptions and the
//! retryable/non-retryable verdict that drives the backoff loop.

use tonic::{Code, Status};

/// Human-readable description for a gRPC status code.
pub fn describe(code: Code) -> &'static str {
    match code {
        Code::Ok => "Success",
        Code::Cancelled => "Operation cancelled",
        Code::Unknown => "Unknown error",
        Code::InvalidArgument => "Invalid request parameters",
        Code::DeadlineExceeded => "Request timeout",
        Code::NotFound => "Resource not found",
        Code::AlreadyExists => "Resource already exists",
        Code::PermissionDenied => "Permission denied",
        Code::ResourceExhausted => "Resource exhausted",
        Code::FailedPrecondition => "Precondition failed",
        Code::Aborted => "Operation aborted",
        Code::OutOfRange => "Out of range",
        Code::Unimplemented => "Not implemented",
        Code::Internal => "Internal server error",
        Code::Unavailable => "Service unavailable",
        Code::DataLoss => "Data loss",
        Code::Unauthenticated => "Authentication required",
    }
}

/// Description for a raw wire code. Values outside the canonical 0..=16
/// range have no [`Code`] representation and map to a fixed fallback.
pub fn describe_raw(code: i32) -> &'static str {
    if !(0..=16).contains(&code) {
        return "Unknown error code";
    }
    describe(Code::from(code))
}

/// Whether a call that failed with this code is worth retrying.
///
/// Success is never retryable.
pub fn is_retryable(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::ResourceExhausted | Code::Internal
    )
}

/// Format a status for log output: `{description}: {message}`, or the
/// description alone when the status carries no message.
pub fn format_status(status: &Status) -> String {
    let description = describe(status.code());
    if status.message().is_empty() {
        description.to_string()
    } else {
        format!("{description}: {}", status.message())
    }
}
