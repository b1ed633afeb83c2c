// src/adapters/signer/ed25519.rs
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::Signer as _;
use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::domain::auth::{AuthHandler, Identity, SignError};
use crate::ports::signer::Signer;

/// Ed25519 signer backed by `ed25519-dalek`, the algorithm NKeys use.
///
/// The secret key is zeroized on drop by `SigningKey` itself; seeds passed to
/// `from_seed` are wiped once the key is built.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    /// Build from a 32-byte seed. The caller's copy is zeroized.
    #[must_use]
    pub fn from_seed(seed: &mut [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(seed);
        seed.zeroize();
        Self { key }
    }

    #[must_use]
    pub fn from_signing_key(key: SigningKey) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Identity derived from the public key: URL-safe unpadded base64.
    ///
    /// Deployments using encoded NKey strings (`U...`) should pass that string
    /// to `AuthHandler::new` instead.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(URL_SAFE_NO_PAD.encode(self.key.verifying_key().as_bytes()))
    }

    /// Auth handler using `identity()` as the id.
    #[must_use]
    pub fn into_auth_handler(self) -> AuthHandler {
        let id = self.identity();
        AuthHandler::new(id, self)
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SignError> {
        Ok(self.key.sign(data).to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::Nonce;
    use ed25519_dalek::{Signature, Verifier};

    #[test]
    fn signature_verifies_over_nonce_bytes() {
        let mut seed = [7u8; 32];
        let signer = Ed25519Signer::from_seed(&mut seed);
        assert_eq!(seed, [0u8; 32], "seed must be wiped");
        let vk = signer.verifying_key();
        let ah = signer.into_auth_handler();

        let sig = ah.sign(&Nonce::from("N1")).unwrap();
        assert_eq!(sig.len(), 64);
        let bytes: [u8; 64] = sig.as_bytes().try_into().unwrap();
        assert!(vk.verify(b"N1", &Signature::from_bytes(&bytes)).is_ok());
        assert!(vk.verify(b"N2", &Signature::from_bytes(&bytes)).is_err());
    }

    #[test]
    fn identity_is_public_key() {
        let signer = Ed25519Signer::from_signing_key(SigningKey::from_bytes(&[1u8; 32]));
        let id = signer.identity();
        let decoded = URL_SAFE_NO_PAD.decode(id.as_str()).unwrap();
        assert_eq!(decoded, signer.verifying_key().as_bytes().to_vec());
    }
}
