use crate::session::{endpoint_id_or_random, Endpoint, ServerConfig, Session, SessionError};
use crate::track::SessionHandler;

use std::sync::Arc;

/// Server-mode entry point: accepts setup on connections the caller's
/// listener produced.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Take over one accepted connection: await CLIENT_SETUP, reply
    /// SERVER_SETUP, and hand back the engine plus the application handle.
    pub async fn accept(
        &self,
        webtransport: web_transport::Session,
        handler: Arc<dyn SessionHandler>,
    ) -> Result<(Session, Endpoint), SessionError> {
        log::debug!(
            "accepting connection on {}:{}",
            self.config.server_bind_ip,
            self.config.server_port
        );

        Session::accept(
            webtransport,
            endpoint_id_or_random(&self.config.endpoint_id),
            self.config.metrics_sample_ms,
            handler,
        )
        .await
    }
}
