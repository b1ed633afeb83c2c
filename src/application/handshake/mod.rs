pub mod classify;
pub mod errors;
pub mod fsm_machine;
pub mod fsm_types;

pub use classify::*;
pub use errors::*;
pub use fsm_machine::*;
pub use fsm_types::*;
