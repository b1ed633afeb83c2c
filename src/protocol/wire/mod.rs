pub mod connect;
pub mod frame;
pub mod info;

pub use connect::*;
pub use frame::*;
pub use info::*;
