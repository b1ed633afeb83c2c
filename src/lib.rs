//! Crate root for `nkey_handshake`.
//!
//! Client side of the NKey challenge/response handshake used by NATS-style
//! message-bus servers: the server's `INFO` carries a nonce, the client signs
//! it with the caller's key and proves its identity in `CONNECT`, and the
//! server answers with `PONG` (accepted) or `-ERR` (rejected).
//!
//! High‑level tree:
//! * `domain::auth` – identity, nonce, signature and the `AuthHandler` binding.
//! * `ports` – the `Signer` capability callers implement.
//! * `protocol::wire` – control-line framing and `INFO`/`CONNECT` payloads.
//! * `application::handshake` – the per-attempt state machine and error classification.
//! * `application::connect` – tokio driver and the caller's `ConnectionHandle`.
//! * `adapters::signer` – ed25519 signer backed by `ed25519-dalek`.
//!
//! ```no_run
//! use nkey_handshake::{ConnectOptions, adapters::signer::Ed25519Signer, connect_tcp};
//!
//! # async fn run() -> Result<(), nkey_handshake::ConnectError> {
//! let mut seed = [0u8; 32]; // load from your credential store
//! let auth = Ed25519Signer::from_seed(&mut seed).into_auth_handler();
//! let mut conn = connect_tcp("127.0.0.1:4222", ConnectOptions::default().with_auth_handler(auth)).await?;
//! conn.flush().await?;
//! # Ok(())
//! # }
//! ```
pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod protocol;
#[cfg(test)]
pub(crate) mod test_support;

pub use application::connect::{ConnectionHandle, connect, connect_tcp};
pub use application::events::ConnectionEvent;
pub use application::handshake::{ConnectError, ErrorCode, HandshakeOutcome, HandshakeState};
pub use config::ConnectOptions;
pub use domain::auth::{AuthHandler, Identity, Nonce, SignError, Signature};
pub use ports::signer::Signer;
