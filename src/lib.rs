mod utils;
mod amf;
mod flv;
mod protocol;
mod handshake;
mod chunk;
mod message;
mod connection;
mod handlers;
mod stream;
mod server;

// Re-export commonly used types at crate root
pub use utils::*;
pub use amf::*;
pub use flv::*;
pub use protocol::*;
pub use handshake::*;
pub use chunk::*;
pub use message::*;
pub use connection::*;

// Command handlers
pub use handlers::{CommandHandler, CommandHandlerRegistry};

// Stream exports
pub use stream::*;

// Server exports
pub use server::{hls, http_flv, App, Registry, RtmpServer, ServerConfig, ServerConfigBuilder};
