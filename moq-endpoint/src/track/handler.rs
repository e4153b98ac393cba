use crate::coding::{FullTrackName, Location, TrackNamespace};
use crate::data::{Extensions, ObjectStatus};
use crate::message::{FilterType, GroupOrder};
use crate::track::{
    ConnectionMetrics, PublishStatus, PublishTrackMetrics, SessionStatus, SubscribeStatus,
    SubscribeTrackMetrics, TrackMode,
};

use bytes::Bytes;

/// Everything known about one object besides its payload.
///
/// Carried outbound on [publish](crate::session::Publication::publish_object)
/// and inbound into
/// [SubscribeTrackHandler::object_received].
#[derive(Clone, Debug)]
pub struct ObjectHeaders {
    pub group_id: u64,
    pub object_id: u64,

    /// Set for objects that rode a subgroup stream.
    pub subgroup_id: Option<u64>,

    /// Smaller values are sent first.
    pub priority: u8,

    /// How long the transport may buffer this object before discarding it.
    pub ttl_ms: Option<u32>,

    pub status: ObjectStatus,
    pub end_of_group: bool,

    pub extensions: Option<Extensions>,
}

impl ObjectHeaders {
    pub fn new(group_id: u64, object_id: u64) -> Self {
        Self {
            group_id,
            object_id,
            subgroup_id: None,
            priority: 128,
            ttl_ms: None,
            status: ObjectStatus::Available,
            end_of_group: false,
            extensions: None,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.group_id, self.object_id)
    }
}

/// Application callbacks for a subscribed track. Invoked from the engine's
/// receive tasks; implementations must not block.
#[allow(unused_variables)]
pub trait SubscribeTrackHandler: Send + Sync {
    fn status_changed(&self, status: SubscribeStatus) {}

    fn object_received(&self, headers: ObjectHeaders, payload: Bytes) {}

    fn metrics_sampled(&self, metrics: &SubscribeTrackMetrics) {}
}

/// Application callbacks for a published track.
#[allow(unused_variables)]
pub trait PublishTrackHandler: Send + Sync {
    fn status_changed(&self, status: PublishStatus) {}

    fn metrics_sampled(&self, metrics: &PublishTrackMetrics) {}
}

/// Connection-level application callbacks.
#[allow(unused_variables)]
pub trait SessionHandler: Send + Sync {
    fn status_changed(&self, status: SessionStatus) {}

    /// Return false to reject the namespace with
    /// PUBLISH_NAMESPACE_ERROR.
    fn publish_namespace_received(&self, namespace: &TrackNamespace) -> bool {
        true
    }

    /// Return false to reject a namespace-prefix subscription.
    fn subscribe_namespace_received(&self, prefix: &TrackNamespace) -> bool {
        true
    }

    /// A SUBSCRIBE arrived for a track with no publication bound. Return
    /// true when the application will bind a publisher for it via
    /// [crate::session::Endpoint::bind_publisher_track]; false replies
    /// SUBSCRIBE_ERROR.
    fn subscribe_received(&self, namespace: &TrackNamespace, name: &[u8], request_id: u64) -> bool {
        false
    }

    /// The answer to a local [crate::session::Endpoint::request_track_status]
    /// query: the largest available location, or None for an error or an
    /// empty track.
    fn track_status_received(&self, request_id: u64, largest: Option<Location>) {}

    /// The peer asked us to reconnect elsewhere; the session keeps serving
    /// in-flight work until closed locally.
    fn goaway_received(&self, new_session_uri: &str) {}

    fn metrics_sampled(&self, metrics: &ConnectionMetrics) {}
}

/// What to subscribe to and how.
#[derive(Clone, Debug)]
pub struct SubscribeConfig {
    pub full_track_name: FullTrackName,

    pub priority: u8,
    pub group_order: GroupOrder,
    pub filter_type: FilterType,

    /// Required for the absolute filter types.
    pub start_location: Option<Location>,
    pub end_group: Option<u64>,
}

impl SubscribeConfig {
    pub fn new(full_track_name: FullTrackName) -> Self {
        Self {
            full_track_name,
            priority: 128,
            group_order: GroupOrder::default(),
            filter_type: FilterType::LatestObject,
            start_location: None,
            end_group: None,
        }
    }
}

/// What to publish and how.
#[derive(Clone, Debug)]
pub struct PublishConfig {
    pub full_track_name: FullTrackName,

    pub track_mode: TrackMode,
    pub default_priority: u8,

    /// Per-object queue dwell bound handed to the transport.
    pub default_ttl_ms: u32,
}

impl PublishConfig {
    pub fn new(full_track_name: FullTrackName, track_mode: TrackMode) -> Self {
        Self {
            full_track_name,
            track_mode,
            default_priority: 128,
            default_ttl_ms: 1000,
        }
    }
}

/// The range a fetch pulls: a named range, or a joining fetch hanging off an
/// existing subscription.
#[derive(Clone, Debug)]
pub enum FetchKind {
    Standalone {
        full_track_name: FullTrackName,
        start_location: Location,
        end_location: Location,
    },
    Joining {
        joining_request_id: u64,
        joining_start: u64,
    },
}

/// What to fetch and how.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub kind: FetchKind,
    pub priority: u8,
    pub group_order: GroupOrder,
}
