mod server;
mod config;
mod registry;
pub mod http_flv;
pub mod hls;

pub use server::RtmpServer;
pub use config::{ServerConfig, ServerConfigBuilder};
pub use registry::*;
