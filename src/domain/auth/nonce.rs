use core::fmt;
use serde::{Deserialize, Serialize};

/// Number of leading characters shown when a nonce is displayed.
const NONCE_DISPLAY_PREFIX: usize = 4;

/// Server-issued challenge carried in `INFO.nonce`.
///
/// The server sends the nonce as a JSON string; the bytes signed are exactly
/// the UTF-8 bytes of that string, and the same string is echoed back in
/// `CONNECT.nonce`.
///
/// Invariants:
/// - Issued once per connection attempt and consumed exactly once; a
///   coordinator never signs two nonces.
/// - Never mutated after issuance.
/// - `Debug` and `Display` redact the value so it does not end up verbatim in logs.
///
/// # Examples
/// ```
/// use nkey_handshake::domain::auth::Nonce;
/// let n = Nonce::from("rM3d9Qk2Lw0");
/// assert_eq!(n.as_bytes(), b"rM3d9Qk2Lw0");
/// assert_eq!(format!("{n}"), "rM3d…");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Bytes handed to the signer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The nonce as received on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce(..)")
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix only, enough for log correlation.
        let prefix: String = self.0.chars().take(NONCE_DISPLAY_PREFIX).collect();
        write!(f, "{prefix}…")
    }
}

impl From<&str> for Nonce {
    fn from(value: &str) -> Self {
        Nonce(value.to_owned())
    }
}

impl From<String> for Nonce {
    fn from(value: String) -> Self {
        Nonce(value)
    }
}

impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
