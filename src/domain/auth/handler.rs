use core::fmt;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::domain::auth::{Identity, Nonce, SignError, Signature};
use crate::ports::signer::Signer;

/// Binds a public identity to a signing capability.
///
/// Built by the caller before connecting. Cloning is cheap and clones share
/// the same signer, so one handler can serve several sequential attempts;
/// each attempt signs its own fresh nonce. The handshake treats the handler as
/// read-only: it reads `id()` and calls `sign()`, nothing else.
#[derive(Clone)]
pub struct AuthHandler {
    id: Identity,
    signer: Arc<dyn Signer>,
}

impl AuthHandler {
    /// Bind `id` to `signer`.
    pub fn new<S: Signer + 'static>(id: impl Into<Identity>, signer: S) -> Self {
        Self {
            id: id.into(),
            signer: Arc::new(signer),
        }
    }

    /// Bind `id` to an already shared signer.
    pub fn from_shared(id: impl Into<Identity>, signer: Arc<dyn Signer>) -> Self {
        Self {
            id: id.into(),
            signer,
        }
    }

    /// Public identity sent as `CONNECT.nkey`.
    #[must_use]
    pub fn id(&self) -> &Identity {
        &self.id
    }

    /// Sign `nonce` with the bound signer.
    ///
    /// A panicking signer is contained here and reported as
    /// `SignError::Panicked`, the same way an `Err` return is reported.
    ///
    /// # Errors
    /// - `SignError::Failed` if the signer returned an error.
    /// - `SignError::Panicked` if the signer panicked.
    /// - `SignError::EmptySignature` if the signer returned no bytes.
    pub fn sign(&self, nonce: &Nonce) -> Result<Signature, SignError> {
        let signer = &self.signer;
        let raw = catch_unwind(AssertUnwindSafe(|| signer.sign(nonce.as_bytes())))
            .map_err(|payload| SignError::Panicked(panic_message(payload.as_ref())))??;
        if raw.is_empty() {
            return Err(SignError::EmptySignature);
        }
        Ok(Signature::from(raw))
    }
}

impl fmt::Debug for AuthHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHandler")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn sign_forwards_nonce_bytes() {
        let ah = AuthHandler::new("PUB_abc", |data: &[u8]| -> Result<Vec<u8>, SignError> {
            let mut out = b"sig:".to_vec();
            out.extend_from_slice(data);
            Ok(out)
        });
        let sig = ah.sign(&Nonce::from("N1")).unwrap();
        assert_eq!(sig.as_bytes(), b"sig:N1");
        assert_eq!(ah.id().as_str(), "PUB_abc");
    }

    #[test]
    fn signer_error_is_wrapped() {
        let ah = AuthHandler::new("foo", |_: &[u8]| -> Result<Vec<u8>, SignError> {
            Err(SignError::new("testing error"))
        });
        let err = ah.sign(&Nonce::from("N1")).unwrap_err();
        assert!(matches!(err, SignError::Failed(_)));
        assert_eq!(err.to_string(), "signer failed: testing error");
    }

    #[test]
    fn signer_panic_is_contained() {
        let ah = AuthHandler::new("foo", |_: &[u8]| -> Result<Vec<u8>, SignError> {
            panic!("testing error")
        });
        let err = ah.sign(&Nonce::from("N1")).unwrap_err();
        match err {
            SignError::Panicked(msg) => assert_eq!(msg, "testing error"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_signature_rejected() {
        let ah = AuthHandler::new("foo", |_: &[u8]| -> Result<Vec<u8>, SignError> { Ok(vec![]) });
        assert!(matches!(
            ah.sign(&Nonce::from("N1")),
            Err(SignError::EmptySignature)
        ));
    }

    #[test]
    fn clones_share_signer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let ah = AuthHandler::new("foo", move |d: &[u8]| -> Result<Vec<u8>, SignError> {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(d.to_vec())
        });
        let other = ah.clone();
        ah.sign(&Nonce::from("a")).unwrap();
        other.sign(&Nonce::from("b")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_hides_signer() {
        let ah = AuthHandler::new("PUB", |d: &[u8]| -> Result<Vec<u8>, SignError> { Ok(d.to_vec()) });
        let d = format!("{ah:?}");
        assert!(d.contains("PUB"));
        assert!(d.contains(".."));
    }
}
