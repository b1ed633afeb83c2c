pub mod connect;
pub mod events;
pub mod handshake;

pub use connect::*;
pub use events::*;
pub use handshake::*;
