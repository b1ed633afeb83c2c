use crate::domain::auth::SignError;

/// Signing capability supplied by the caller.
///
/// Contract:
/// - `sign(data)` returns a signature over exactly `data` (the server nonce bytes).
/// - Failures are reported as `SignError`; the handshake turns them into an
///   `API_ERROR` and never sends CONNECT afterwards.
/// - Implementations must not assume they are called more than once per
///   connection attempt, nor that they are called at all (servers that issue
///   no nonce skip signing).
///
/// Any `Fn(&[u8]) -> Result<Vec<u8>, SignError>` closure is a `Signer`, so a
/// key pair can be captured directly:
///
/// ```
/// use nkey_handshake::domain::auth::SignError;
/// use nkey_handshake::ports::Signer;
///
/// let signer = |nonce: &[u8]| -> Result<Vec<u8>, SignError> { Ok(nonce.iter().rev().copied().collect()) };
/// assert_eq!(signer.sign(b"ab").unwrap(), b"ba".to_vec());
/// ```
pub trait Signer: Send + Sync {
    /// Sign `data`.
    ///
    /// # Errors
    /// Returns `SignError` when the underlying key or device refuses to sign.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignError>;
}

impl<F> Signer for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, SignError> + Send + Sync,
{
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignError> {
        self(data)
    }
}
