mod broadcast;
mod room;

pub use broadcast::*;
pub use room::*;
