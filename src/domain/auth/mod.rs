/*
NKey authentication material exchanged during the INFO/CONNECT handshake.

Only public values live here: the identity copied into `CONNECT.nkey`, the
server nonce from `INFO.nonce`, and the signature forwarded in `CONNECT.sig`.
Private keys stay behind the caller's `Signer`.
*/

pub mod errors;
pub mod handler;
pub mod identity;
pub mod nonce;
pub mod signature;

pub use errors::SignError;
pub use handler::*;
pub use identity::*;
pub use nonce::*;
pub use signature::*;
