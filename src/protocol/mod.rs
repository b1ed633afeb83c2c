//! Wire protocol: text control lines with JSON `INFO`/`CONNECT` payloads.
pub mod wire;
