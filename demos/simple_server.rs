// Simple RTMP live server
//
// Accepts publishers and players on rtmp://<host>:1935/live/<stream> and
// serves the same rooms as HTTP-FLV on http://<host>:8080/live/<stream>.flv
//
// Usage:
//   RUST_LOG=debug cargo run --example simple_server

use rtmp::{Result, RtmpServer};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let server = RtmpServer::new("0.0.0.0:1935", ["live"])
        .with_http_flv("0.0.0.0:8080");

    info!("Applications: {:?}", server.config().apps);
    info!("Chunk size: {}", server.config().chunk_size);
    info!("Press Ctrl+C to stop");

    tokio::select! {
        result = server.handler() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received Ctrl+C, shutting down");
        }
    }

    info!("Server stopped");
    Ok(())
}
