//! Error types for syskit operations.
//!
//! Only [`SyskitError::InvalidInput`] and [`SyskitError::AllBackendsExhausted`]
//! ever reach a caller. Backend and decode failures are recovered inside the
//! coordinator by moving on to the next candidate; they exist as variants so
//! they can be logged and reported uniformly.

use std::fmt;

use crate::codec::DecodeError;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SyskitErrorCode {
    /// Caller supplied an unusable value
    InvalidInput = 1000,
    /// A backend could not complete a read or write
    BackendUnavailable = 2000,
    /// Stored bytes are not valid encoded output
    Decode = 3000,
    /// Every candidate location failed
    AllBackendsExhausted = 4000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Error type for syskit operations.
#[derive(Debug)]
pub enum SyskitError {
    /// Caller supplied an unusable value. No I/O was attempted.
    InvalidInput {
        /// Parameter name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// A storage backend failed for one candidate location.
    BackendUnavailable {
        /// Backend name (e.g. "direct-path", "catalog")
        backend: String,
        /// Underlying failure
        reason: String,
    },

    /// Stored bytes could not be decoded into a payload.
    Decode(String),

    /// No candidate location accepted the write or yielded a payload.
    AllBackendsExhausted {
        /// Number of candidates tried
        attempts: usize,
    },

    /// Internal/unexpected error.
    Internal(String),
}

impl SyskitError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> SyskitErrorCode {
        match self {
            Self::InvalidInput { .. } => SyskitErrorCode::InvalidInput,
            Self::BackendUnavailable { .. } => SyskitErrorCode::BackendUnavailable,
            Self::Decode(_) => SyskitErrorCode::Decode,
            Self::AllBackendsExhausted { .. } => SyskitErrorCode::AllBackendsExhausted,
            Self::Internal(_) => SyskitErrorCode::Internal,
        }
    }

    /// Get the error message as an owned String (useful for FFI).
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if the coordinator recovers from this error by trying
    /// the next candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. } | Self::Decode(_))
    }

    /// Create an invalid input error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a backend unavailable error from any displayable failure.
    pub fn backend_unavailable(backend: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for SyskitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { field, reason } => write!(f, "invalid {}: {}", field, reason),
            Self::BackendUnavailable { backend, reason } => {
                write!(f, "{} backend unavailable: {}", backend, reason)
            }
            Self::Decode(msg) => write!(f, "stored payload could not be decoded: {}", msg),
            Self::AllBackendsExhausted { attempts } => {
                write!(f, "all {} storage candidates failed", attempts)
            }
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for SyskitError {}

impl From<DecodeError> for SyskitError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SyskitError::AllBackendsExhausted { attempts: 2 };
        assert_eq!(err.code(), SyskitErrorCode::AllBackendsExhausted);
        assert!(!err.is_recoverable());
        assert_eq!(SyskitErrorCode::InvalidInput as i32, 1000);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(SyskitError::backend_unavailable("catalog", "quota exceeded").is_recoverable());
        assert!(SyskitError::Decode("bad padding".into()).is_recoverable());
        assert!(!SyskitError::invalid_input("payload", "absent").is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = SyskitError::backend_unavailable("direct-path", "permission denied");
        assert_eq!(
            err.to_string(),
            "direct-path backend unavailable: permission denied"
        );

        let err = SyskitError::invalid_input("payload", "absent payload cannot be persisted");
        assert!(err.message().starts_with("invalid payload"));
    }

    #[test]
    fn test_from_decode_error() {
        let decode_err = crate::codec::decode("%%%").unwrap_err();
        let err: SyskitError = decode_err.into();
        assert_eq!(err.code(), SyskitErrorCode::Decode);
    }
}
