/// The lifecycle of a subscription, surfaced via
/// [crate::track::SubscribeTrackHandler::status_changed].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SubscribeStatus {
    #[default]
    NotSubscribed,
    /// SUBSCRIBE sent, awaiting SUBSCRIBE_OK or SUBSCRIBE_ERROR.
    PendingResponse,
    Ok,
    Error,
    NotAuthorized,
    SendingUnsubscribe,
    Paused,
    NewGroupRequested,
    NotConnected,
}

/// The lifecycle of a publication, surfaced via
/// [crate::track::PublishTrackHandler::status_changed].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PublishStatus {
    #[default]
    NotAnnounced,
    /// PUBLISH_NAMESPACE sent, awaiting the peer's verdict.
    PendingAnnounceResponse,
    AnnounceNotAuthorized,
    /// Announced and ready; no subscriber bound yet.
    NoSubscribers,
    Ok,
    SendingUnannounce,
    NotConnected,
}

/// Synchronous result of publishing one object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PublishObjectStatus {
    Ok,
    /// The track has no alias yet; the announce has not completed.
    NotAnnounced,
    /// No subscriber is bound to the track.
    NoSubscribers,
}

/// The lifecycle of a connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SessionStatus {
    #[default]
    NotReady,
    Connecting,
    /// Both setup messages have completed.
    Ready,
    NotConnected,
}
