mod packet;
mod command;
mod data;
pub mod control;
pub mod constants;

pub use packet::*;
pub use command::*;
pub use data::*;
pub use control::{LimitType, UserControlEvent};
pub use constants::*;
