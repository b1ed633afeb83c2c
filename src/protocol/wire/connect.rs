use serde::{Deserialize, Serialize};

use crate::domain::auth::{Identity, Nonce, Signature};

/// Value of `CONNECT.lang`.
pub const CLIENT_LANG: &str = "rust";
/// Protocol level advertised in `CONNECT.protocol`.
pub const CLIENT_PROTOCOL: u8 = 1;

/// Payload of the client's `CONNECT` frame.
///
/// Authentication fields (`nkey`, `sig`, `nonce`) are filled by the handshake
/// coordinator after signing; everything else comes from `ConnectOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub verbose: bool,
    pub pedantic: bool,
    pub tls_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub lang: String,
    pub version: String,
    pub protocol: u8,
    pub echo: bool,
    pub headers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nkey: Option<Identity>,
    /// URL-safe unpadded base64 of the signature over `nonce`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Nonce>,
}

impl ConnectRequest {
    /// Attach NKey proof: identity, signature and the nonce it covers.
    pub fn set_nkey_auth(&mut self, id: &Identity, sig: &Signature, nonce: &Nonce) {
        self.nkey = Some(id.clone());
        self.sig = Some(sig.to_wire());
        self.nonce = Some(nonce.clone());
    }

    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.nkey.is_some() && self.sig.is_some()
    }
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self {
            verbose: false,
            pedantic: false,
            tls_required: false,
            name: None,
            lang: CLIENT_LANG.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            protocol: CLIENT_PROTOCOL,
            echo: true,
            headers: false,
            nkey: None,
            sig: None,
            nonce: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_connect_omits_auth_fields() {
        let json = serde_json::to_string(&ConnectRequest::default()).unwrap();
        assert!(!json.contains("nkey"));
        assert!(!json.contains("sig"));
        assert!(!json.contains("nonce"));
        assert!(json.contains(r#""lang":"rust""#));
    }

    #[test]
    fn auth_fields_carry_identity_signature_and_nonce() {
        let mut req = ConnectRequest::default();
        req.set_nkey_auth(
            &Identity::from("PUB_abc"),
            &Signature::from(vec![0xfb, 0xff]),
            &Nonce::from("N1"),
        );
        assert!(req.has_auth());
        let v: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(v["nkey"], "PUB_abc");
        assert_eq!(v["sig"], "-_8");
        assert_eq!(v["nonce"], "N1");
    }
}
