//! Maps handshake outcomes onto the error taxonomy callers see.
//!
//! Classification is by origin. A failure raised by the caller's signer is
//! `API_ERROR` and can never become `AUTHORIZATION_VIOLATION`, which is only
//! produced from a server `-ERR`. Callers rely on that split: the first means
//! "fix the signer", the second "try different credentials".

use core::fmt;
use std::sync::Arc;

use super::errors::HandshakeFailure;
use super::fsm_types::HandshakeOutcome;

/// Server text that marks an authorization rejection.
pub const AUTHORIZATION_VIOLATION_TEXT: &str = "Authorization Violation";

/// Closed set of error kinds surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The caller-supplied auth callback failed.
    ApiError,
    /// The server rejected the presented identity.
    AuthorizationViolation,
    /// No decision before the connect timeout.
    ConnectionTimeout,
    /// Unexpected or malformed frame during the handshake.
    ProtocolError,
    /// The caller cancelled the attempt.
    Cancelled,
    /// Transport I/O failure or EOF before a decision.
    ConnectionError,
    /// Any other `-ERR`, carried exactly as the server sent it.
    Server(String),
}

impl ErrorCode {
    /// Classify the text of a server `-ERR` frame.
    #[must_use]
    pub fn from_server(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case(AUTHORIZATION_VIOLATION_TEXT) {
            ErrorCode::AuthorizationViolation
        } else {
            ErrorCode::Server(text.to_owned())
        }
    }

    /// Stable string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::ApiError => "API_ERROR",
            ErrorCode::AuthorizationViolation => "AUTHORIZATION_VIOLATION",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::ConnectionError => "CONNECTION_ERROR",
            ErrorCode::Server(text) => text,
        }
    }

    /// True when the failure originated on the client side.
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            ErrorCode::AuthorizationViolation | ErrorCode::Server(_)
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&HandshakeFailure> for ErrorCode {
    fn from(failure: &HandshakeFailure) -> Self {
        match failure {
            HandshakeFailure::Signing(_) => ErrorCode::ApiError,
            HandshakeFailure::Timeout => ErrorCode::ConnectionTimeout,
            HandshakeFailure::Cancelled => ErrorCode::Cancelled,
            HandshakeFailure::Protocol(_) | HandshakeFailure::Wire(_) => ErrorCode::ProtocolError,
            HandshakeFailure::Transport(_) => ErrorCode::ConnectionError,
        }
    }
}

/// Classified error delivered with the `error` event.
///
/// Cheap to clone; the local cause, when there is one, is shared.
#[derive(Debug, Clone)]
pub struct ConnectError {
    code: ErrorCode,
    message: String,
    cause: Option<Arc<HandshakeFailure>>,
}

impl ConnectError {
    /// Error for a server `-ERR` with the given text.
    #[must_use]
    pub fn from_server(text: &str) -> Self {
        Self {
            code: ErrorCode::from_server(text),
            message: text.to_owned(),
            cause: None,
        }
    }

    #[must_use]
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Local cause, absent for server rejections.
    #[must_use]
    pub fn cause(&self) -> Option<&HandshakeFailure> {
        self.cause.as_deref()
    }

    /// True when retrying with different credentials could succeed.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        self.code == ErrorCode::AuthorizationViolation
    }
}

impl From<HandshakeFailure> for ConnectError {
    fn from(failure: HandshakeFailure) -> Self {
        Self {
            code: ErrorCode::from(&failure),
            message: failure.to_string(),
            cause: Some(Arc::new(failure)),
        }
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Turn a terminal outcome into the caller-facing result.
///
/// # Errors
/// Returns the classified `ConnectError` for `Rejected` and `LocalFailure`.
pub fn classify(outcome: HandshakeOutcome) -> Result<(), ConnectError> {
    match outcome {
        HandshakeOutcome::Accepted => Ok(()),
        HandshakeOutcome::Rejected(reason) => Err(ConnectError::from_server(&reason)),
        HandshakeOutcome::LocalFailure(failure) => Err(ConnectError::from(failure)),
    }
}
