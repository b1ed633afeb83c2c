use thiserror::Error;

use crate::domain::auth::SignError;
use crate::protocol::wire::WireError;

/// Why an attempt ended in `HandshakeOutcome::LocalFailure`.
///
/// Everything that went wrong on the client side of the handshake. Server
/// rejections are not failures of this kind; they arrive as
/// `HandshakeOutcome::Rejected` with the server's own text.
#[derive(Debug, Error)]
pub enum HandshakeFailure {
    /// The caller-supplied signer failed; CONNECT was not sent.
    #[error("auth handler could not sign the server nonce: {0}")]
    Signing(#[from] SignError),

    #[error("handshake timed out")]
    Timeout,

    #[error("handshake was cancelled")]
    Cancelled,

    /// A frame arrived that the current state does not allow.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The server sent something that could not be decoded.
    #[error("malformed server frame: {0}")]
    Wire(#[from] WireError),

    /// The transport failed or closed before a decision was reached.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
