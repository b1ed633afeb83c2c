use serde::{Deserialize, Serialize};

use crate::domain::auth::Nonce;

/// Payload of the server's `INFO` frame.
///
/// Only `nonce` matters to authentication; the remaining fields are kept so
/// callers can inspect what they connected to. Unknown fields are ignored,
/// servers add new ones regularly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub server_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub proto: i32,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub max_payload: u64,
    #[serde(default)]
    pub headers: bool,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(default)]
    pub tls_required: bool,
    /// Challenge to sign; absent when the server does not ask for NKey proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Nonce>,
}

impl ServerInfo {
    /// Nonce to sign, treating an empty string the same as no nonce.
    #[must_use]
    pub fn challenge(&self) -> Option<&Nonce> {
        self.nonce.as_ref().filter(|n| !n.is_empty())
    }
}
