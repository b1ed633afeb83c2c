#![allow(dead_code)]
#![cfg(test)]
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::auth::{AuthHandler, SignError};
use crate::protocol::wire::{ServerFrame, ServerInfo};

/// `INFO` carrying `nonce` (or none).
pub fn mk_info(nonce: Option<&str>) -> ServerInfo {
    ServerInfo {
        server_id: "NTEST".into(),
        version: "2.10.0".into(),
        proto: 1,
        host: "127.0.0.1".into(),
        port: 4222,
        max_payload: 1024 * 1024,
        auth_required: nonce.is_some(),
        nonce: nonce.map(Into::into),
        ..ServerInfo::default()
    }
}

pub fn info_frame(nonce: Option<&str>) -> ServerFrame {
    ServerFrame::Info(Box::new(mk_info(nonce)))
}

/// Signer producing `b"sig:" || nonce`, counting its invocations.
pub fn mk_tagging_auth(id: &str) -> (AuthHandler, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let ah = AuthHandler::new(id, move |data: &[u8]| -> Result<Vec<u8>, SignError> {
        c.fetch_add(1, Ordering::SeqCst);
        let mut out = b"sig:".to_vec();
        out.extend_from_slice(data);
        Ok(out)
    });
    (ah, calls)
}

/// Signer that always fails with `"testing error"`.
pub fn mk_failing_auth(id: &str) -> AuthHandler {
    AuthHandler::new(id, |_: &[u8]| -> Result<Vec<u8>, SignError> {
        Err(SignError::new("testing error"))
    })
}
