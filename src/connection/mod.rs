mod connection;
mod session;
mod state;

pub use connection::*;
pub use session::*;
pub use state::*;
