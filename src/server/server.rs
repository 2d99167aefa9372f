use crate::{Error, Result};
use crate::connection::Connection;
use crate::message::MessageDispatcher;
use crate::server::config::ServerConfig;
use crate::server::registry::Registry;
use crate::server::{hls, http_flv};
use axum::Router;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinSet;

pub struct RtmpServer {
    /// Server configuration
    config: Arc<ServerConfig>,

    /// Apps and their rooms, shared with every connection and HTTP handler
    registry: Arc<Registry>,

    /// Message dispatcher shared by all connections
    dispatcher: Arc<MessageDispatcher>,
}

impl RtmpServer {
    /// Server on `addr` accepting the given application names
    pub fn new<I, S>(addr: impl Into<String>, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_config(ServerConfig {
            rtmp_addr: addr.into(),
            apps: apps.into_iter().map(Into::into).collect(),
            ..ServerConfig::default()
        })
    }

    pub fn from_config(config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new(config.apps.iter().cloned()));
        RtmpServer {
            config: Arc::new(config),
            registry,
            dispatcher: Arc::new(MessageDispatcher::new()),
        }
    }

    /// Also serve `GET /{app}/{stream}.flv` on `addr`
    pub fn with_http_flv(mut self, addr: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).http_flv_addr = Some(addr.into());
        self
    }

    /// Also route HLS playlist and segment requests on `addr`
    pub fn with_hls(mut self, addr: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).hls_addr = Some(addr.into());
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Bind every configured listener and serve until one of them fails
    pub async fn handler(self) -> Result<()> {
        self.config.validate()?;

        let rtmp_listener = bind(&self.config.rtmp_addr).await?;
        log::info!("RTMP server listening on {}", self.config.rtmp_addr);

        let mut listeners = JoinSet::new();

        if let Some(addr) = &self.config.http_flv_addr {
            let listener = bind(addr).await?;
            log::info!("HTTP-FLV server listening on {}", addr);
            listeners.spawn(serve_http(listener, http_flv::router(self.registry.clone()), "HTTP-FLV"));
        }

        if let Some(addr) = &self.config.hls_addr {
            let listener = bind(addr).await?;
            log::info!("HLS server listening on {}", addr);
            listeners.spawn(serve_http(listener, hls::router(self.registry.clone()), "HLS"));
        }

        listeners.spawn(self.accept_loop(rtmp_listener));

        let result = match listeners.join_next().await {
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(Error::connection(format!("Listener task failed: {}", e))),
            None => Ok(()),
        };
        listeners.abort_all();

        if let Err(e) = &result {
            log::error!("Server stopped: {}", e);
        }
        result
    }

    async fn accept_loop(self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::warn!("Accept error: {}", e);
                    continue;
                }
            };

            log::info!("New connection from {}", peer_addr);
            self.handle_connection(stream, peer_addr.to_string());
        }
    }

    fn handle_connection(&self, stream: TcpStream, peer_addr: String) {
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
        }

        let connection = Connection::new(
            peer_addr.clone(),
            self.registry.clone(),
            self.config.clone(),
            self.dispatcher.clone(),
        );

        tokio::spawn(async move {
            match connection.run(stream).await {
                Ok(()) => log::info!("Connection {} closed", peer_addr),
                Err(e) => log::warn!("Connection {} closed: {}", peer_addr, e),
            }
        });
    }
}

async fn serve_http(listener: TcpListener, router: Router, name: &'static str) -> Result<()> {
    axum::serve(listener, router)
        .await
        .map_err(|e| Error::connection(format!("{} listener failed: {}", name, e)))
}

/// Bind with SO_REUSEADDR so restarts don't wait out TIME_WAIT
async fn bind(addr: &str) -> Result<TcpListener> {
    let socket_addr = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| Error::config(format!("Invalid address {}: {}", addr, e)))?
        .next()
        .ok_or_else(|| Error::config(format!("Address {} did not resolve", addr)))?;

    let socket = if socket_addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(socket_addr)
        .map_err(|e| Error::connection(format!("Failed to bind {}: {}", addr, e)))?;

    Ok(socket.listen(1024)?)
}
