use crate::session::{endpoint_id_or_random, ClientConfig, Endpoint, Session, SessionError};
use crate::track::SessionHandler;

use std::sync::Arc;

/// Client-mode entry point.
///
/// The QUIC/WebTransport connection itself is established by the caller
/// (the transport layer is outside the engine); `connect` takes over the
/// established session, performs setup, and returns the engine plus the
/// application handle.
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Negotiate CLIENT_SETUP/SERVER_SETUP on a fresh connection.
    ///
    /// Returns the [Session] to be driven with `run()` and the [Endpoint]
    /// handle for subscribe/publish/fetch calls.
    pub async fn connect(
        &self,
        webtransport: web_transport::Session,
        handler: Arc<dyn SessionHandler>,
    ) -> Result<(Session, Endpoint), SessionError> {
        log::info!("connecting to {}", self.config.connect_uri);

        Session::connect(
            webtransport,
            endpoint_id_or_random(&self.config.endpoint_id),
            self.config.metrics_sample_ms,
            handler,
        )
        .await
    }
}
