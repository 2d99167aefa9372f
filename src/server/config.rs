use std::collections::HashSet;
use crate::{Error, Result, DEFAULT_PEER_BANDWIDTH, DEFAULT_WINDOW_SIZE, SERVER_CHUNK_SIZE};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// RTMP listen address
    pub rtmp_addr: String,

    /// Application names accepted in `connect`
    pub apps: Vec<String>,

    /// HTTP-FLV listen address
    pub http_flv_addr: Option<String>,

    /// HLS listen address
    pub hls_addr: Option<String>,

    /// Outbound chunk size announced after connect
    pub chunk_size: u32,

    /// Window acknowledgement size
    pub window_ack_size: u32,

    /// Peer bandwidth
    pub peer_bandwidth: u32,

    /// Packets buffered per connection between the session and its writer
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            rtmp_addr: "0.0.0.0:1935".to_string(),
            apps: vec!["live".to_string()],
            http_flv_addr: None,
            hls_addr: None,
            chunk_size: SERVER_CHUNK_SIZE,
            window_ack_size: DEFAULT_WINDOW_SIZE,
            peer_bandwidth: DEFAULT_PEER_BANDWIDTH,
            outbound_queue: 100,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.apps.is_empty() {
            return Err(Error::config("At least one application is required"));
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.is_empty() {
                return Err(Error::config("Application name must not be empty"));
            }
            if !seen.insert(app.as_str()) {
                return Err(Error::config(format!("Duplicate application '{}'", app)));
            }
        }

        if self.chunk_size < 128 {
            return Err(Error::config("Chunk size must be at least 128"));
        }

        if self.chunk_size > 65536 {
            return Err(Error::config("Chunk size must not exceed 65536"));
        }

        if self.window_ack_size == 0 {
            return Err(Error::config("Invalid window_ack_size: 0"));
        }

        if self.peer_bandwidth == 0 {
            return Err(Error::config("Invalid peer_bandwidth: 0"));
        }

        if self.outbound_queue == 0 {
            return Err(Error::config("Invalid outbound_queue: 0"));
        }

        Ok(())
    }
}

/// Builder for ServerConfig
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        ServerConfigBuilder {
            config: ServerConfig::default(),
        }
    }

    pub fn rtmp_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.rtmp_addr = addr.into();
        self
    }

    /// Replace the application list
    pub fn apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.apps = apps.into_iter().map(Into::into).collect();
        self
    }

    pub fn http_flv_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_flv_addr = Some(addr.into());
        self
    }

    pub fn hls_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.hls_addr = Some(addr.into());
        self
    }

    pub fn chunk_size(mut self, size: u32) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn window_ack_size(mut self, size: u32) -> Self {
        self.config.window_ack_size = size;
        self
    }

    pub fn peer_bandwidth(mut self, size: u32) -> Self {
        self.config.peer_bandwidth = size;
        self
    }

    pub fn outbound_queue(mut self, size: usize) -> Self {
        self.config.outbound_queue = size;
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = ServerConfig::builder()
            .rtmp_addr("127.0.0.1:1935")
            .apps(["live", "vod"])
            .http_flv_addr("127.0.0.1:8080")
            .chunk_size(60000)
            .build()
            .unwrap();

        assert_eq!(config.apps, vec!["live".to_string(), "vod".to_string()]);
        assert_eq!(config.http_flv_addr.as_deref(), Some("127.0.0.1:8080"));
        assert!(config.hls_addr.is_none());
        assert_eq!(config.chunk_size, 60000);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let cases = [
            ServerConfig::builder().apps(Vec::<String>::new()),
            ServerConfig::builder().apps(["live", "live"]),
            ServerConfig::builder().apps([""]),
            ServerConfig::builder().chunk_size(64),
            ServerConfig::builder().chunk_size(70000),
            ServerConfig::builder().window_ack_size(0),
            ServerConfig::builder().peer_bandwidth(0),
            ServerConfig::builder().outbound_queue(0),
        ];
        for builder in cases {
            assert!(matches!(builder.build(), Err(Error::Configuration(_))));
        }
    }
}
