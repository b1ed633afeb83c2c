//! In-process fake server for driving the handshake over `tokio::io::duplex`.
#![allow(dead_code)]

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use nkey_handshake::adapters::signer::Ed25519Signer;
use nkey_handshake::domain::auth::{AuthHandler, SignError};

pub const AUTH_VIOLATION: &str = "-ERR 'Authorization Violation'\r\n";

/// Known identities and the public keys their signatures must verify under.
#[derive(Default, Clone)]
pub struct Registry(HashMap<String, VerifyingKey>);

impl Registry {
    pub fn register(&mut self, signer: &Ed25519Signer) {
        self.0
            .insert(signer.identity().as_str().to_owned(), signer.verifying_key());
    }

    fn verify(&self, req: &Value, nonce: &str) -> bool {
        let (Some(id), Some(sig)) = (req["nkey"].as_str(), req["sig"].as_str()) else {
            return false;
        };
        let Some(key) = self.0.get(id) else {
            return false;
        };
        let Ok(raw) = URL_SAFE_NO_PAD.decode(sig) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(&raw) else {
            return false;
        };
        req["nonce"].as_str() == Some(nonce) && key.verify(nonce.as_bytes(), &sig).is_ok()
    }
}

/// What the fake server saw during one attempt.
#[derive(Debug, Default)]
pub struct ServerLog {
    pub nonce: String,
    pub lines: Vec<String>,
    pub connects: Vec<Value>,
}

pub fn random_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn info_line(nonce: &str) -> String {
    let info = json!({
        "server_id": "NFAKE",
        "version": "2.10.0",
        "proto": 1,
        "host": "127.0.0.1",
        "port": 4222,
        "max_payload": 1048576,
        "auth_required": true,
        "nonce": nonce,
    });
    format!("INFO {info}\r\n")
}

/// Handler for the key derived from `[seed; 32]`, plus a second signer over
/// the same key so the test can register its public half.
pub fn ed25519_auth(seed: u8) -> (AuthHandler, Ed25519Signer) {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let handler = Ed25519Signer::from_signing_key(key.clone()).into_auth_handler();
    (handler, Ed25519Signer::from_signing_key(key))
}

fn failing_sign(_: &[u8]) -> Result<Vec<u8>, SignError> {
    Err(SignError::new("testing error"))
}

pub fn failing_auth(id: &str) -> AuthHandler {
    AuthHandler::new(id, failing_sign)
}

/// Spawn a server that issues a fresh nonce, checks the CONNECT signature
/// against `registry`, and answers PONG or `Authorization Violation`.
///
/// The log is returned once the client side closes.
pub fn spawn_verifying_server(registry: Registry) -> (DuplexStream, JoinHandle<ServerLog>) {
    let (client, server) = tokio::io::duplex(8 * 1024);
    let task = tokio::spawn(async move {
        let mut peer = ScriptedPeer::new(server);
        let nonce = random_nonce();
        let mut log = ServerLog {
            nonce: nonce.clone(),
            ..ServerLog::default()
        };
        peer.send(&info_line(&nonce)).await;
        let mut verified = false;
        while let Some(line) = peer.next_line().await {
            log.lines.push(line.clone());
            if let Some(json) = line.strip_prefix("CONNECT ") {
                let req: Value = serde_json::from_str(json).expect("CONNECT json");
                verified = registry.verify(&req, &nonce);
                log.connects.push(req);
                if !verified {
                    peer.send(AUTH_VIOLATION).await;
                    break;
                }
            } else if line == "PING" && verified {
                peer.send("PONG\r\n").await;
            }
        }
        log
    });
    (client, task)
}

/// Server half driven step by step from a test body.
pub struct ScriptedPeer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    wr: WriteHalf<DuplexStream>,
}

impl ScriptedPeer {
    pub fn new(io: DuplexStream) -> Self {
        let (rd, wr) = tokio::io::split(io);
        Self {
            lines: BufReader::new(rd).lines(),
            wr,
        }
    }

    /// Write raw protocol text. Errors are ignored; the client may be gone.
    pub async fn send(&mut self, text: &str) {
        let _ = self.wr.write_all(text.as_bytes()).await;
        let _ = self.wr.flush().await;
    }

    /// Next line from the client without its CRLF, `None` at EOF.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.next_line().await.ok().flatten()
    }

    /// Read until a CONNECT line and return its JSON.
    pub async fn expect_connect(&mut self) -> Value {
        while let Some(line) = self.next_line().await {
            if let Some(json) = line.strip_prefix("CONNECT ") {
                return serde_json::from_str(json).expect("CONNECT json");
            }
        }
        panic!("client closed without sending CONNECT");
    }
}

/// Duplex pair with the server half wrapped for scripting.
pub fn scripted_pair() -> (DuplexStream, ScriptedPeer) {
    scripted_pair_with_capacity(8 * 1024)
}

/// Like `scripted_pair`, with `capacity` bytes of buffering in each direction.
/// A small capacity and a peer that never reads makes client writes block.
pub fn scripted_pair_with_capacity(capacity: usize) -> (DuplexStream, ScriptedPeer) {
    let (client, server) = tokio::io::duplex(capacity);
    (client, ScriptedPeer::new(server))
}
