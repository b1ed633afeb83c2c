use thiserror::Error;

/// Failure raised while producing a signature over a server nonce.
///
/// Whatever the caller-supplied signer reports is wrapped here so its own
/// error type never leaks past the signing boundary.
#[derive(Debug, Error)]
pub enum SignError {
    /// The signer returned an error of its own.
    #[error("signer failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    /// The signer panicked; the panic payload message is kept when it is a string.
    #[error("signer panicked: {0}")]
    Panicked(String),
    /// The signer returned zero bytes, which would produce a malformed CONNECT.
    #[error("signer returned an empty signature")]
    EmptySignature,
}

impl SignError {
    /// Wrap any error (or message) produced by a caller-supplied signer.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        SignError::Failed(err.into())
    }
}
