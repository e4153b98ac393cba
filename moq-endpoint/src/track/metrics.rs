use serde::Serialize;

/// Per-connection counters, sampled on the configured period and delivered
/// via [crate::track::SessionHandler::metrics_sampled].
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConnectionMetrics {
    pub ctrl_messages_sent: u64,
    pub ctrl_messages_received: u64,

    pub objects_sent: u64,
    pub objects_received: u64,

    pub bytes_sent: u64,
    pub bytes_received: u64,

    /// Inbound data messages dropped because no subscriber matched.
    pub unknown_objects_dropped: u64,
}

/// Per-subscription counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SubscribeTrackMetrics {
    pub objects_received: u64,
    pub bytes_received: u64,
}

/// Per-publication counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PublishTrackMetrics {
    pub objects_published: u64,
    pub bytes_published: u64,

    /// Objects refused synchronously (no announce or no subscriber).
    pub objects_dropped: u64,
}
