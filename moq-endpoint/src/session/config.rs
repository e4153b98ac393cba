/// Client endpoint configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Identifier sent in the setup parameters. A random one is generated
    /// when unset.
    pub endpoint_id: Option<String>,

    /// The relay to connect to, `moq://host:port/...`. Informational to the
    /// engine; the QUIC connection itself is established by the caller.
    pub connect_uri: String,

    /// How often sampled counters are delivered to the handlers.
    pub metrics_sample_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_id: None,
            connect_uri: String::new(),
            metrics_sample_ms: 5000,
        }
    }
}

/// Server endpoint configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub endpoint_id: Option<String>,

    /// Listener address, used by the caller to bind the QUIC server.
    pub server_bind_ip: String,
    pub server_port: u16,

    pub metrics_sample_ms: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint_id: None,
            server_bind_ip: "0.0.0.0".to_string(),
            server_port: 4433,
            metrics_sample_ms: 5000,
        }
    }
}

pub(crate) fn endpoint_id_or_random(configured: &Option<String>) -> String {
    configured
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
