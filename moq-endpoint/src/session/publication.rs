use crate::coding::{Encode, TrackHash};
use crate::data::{
    DatagramType, ObjectDatagram, ObjectStatus, StreamHeaderType, SubgroupHeader, SubgroupIdKind,
    SubgroupObject,
};
use crate::message::{error_code::publish_done, PublishDone};
use crate::session::{SessionError, SessionInner};
use crate::track::{
    ObjectHeaders, PublishConfig, PublishObjectStatus, PublishStatus, PublishTrackHandler,
    PublishTrackMetrics, TrackMode,
};

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::Notify;
use tokio::time::Instant;

/// One item queued toward the transport for a publication's data context.
pub(crate) enum TxItem {
    /// Open a fresh unidirectional stream and write the header. `clear`
    /// drops everything still queued (group mode starting a new group).
    NewStream {
        priority: i32,
        clear: bool,
        header: Bytes,
    },
    /// An object record for the current stream.
    Data {
        bytes: Bytes,
        expires: Option<Instant>,
    },
    /// A complete datagram.
    Datagram {
        bytes: Bytes,
        expires: Option<Instant>,
    },
    /// Stop the writer task.
    Close,
}

/// The non-blocking send queue between `publish_object` and the per-context
/// writer task.
#[derive(Default)]
pub(crate) struct DataQueue {
    items: Mutex<VecDeque<TxItem>>,
    notify: Notify,
}

impl DataQueue {
    pub fn push(&self, item: TxItem) {
        {
            let mut items = self.items.lock().unwrap();
            if let TxItem::NewStream { clear: true, .. } = item {
                // Starting a new group obsoletes whatever is still queued.
                items.retain(|i| matches!(i, TxItem::Close));
            }
            items.push_back(item);
        }
        self.notify.notify_one();
    }

    pub async fn pop(&self) -> TxItem {
        loop {
            if let Some(item) = self.items.lock().unwrap().pop_front() {
                return item;
            }
            self.notify.notified().await;
        }
    }
}

pub(crate) struct PublicationState {
    pub status: PublishStatus,

    /// The subscribe request id bound to this publication, if any.
    pub request_id: Option<u64>,
    pub track_alias: u64,

    /// The group the current stream was opened for.
    pub current_group: Option<u64>,
    pub stream_open: bool,
    pub stream_count: u64,

    /// Set when the peer asked for a new group via NEW_GROUP_REQUEST.
    pub new_group_pending: bool,

    /// The largest location published so far, reported in SUBSCRIBE_OK and
    /// TRACK_STATUS_OK replies.
    pub largest: Option<crate::coding::Location>,

    /// Subscriber-requested priority from SUBSCRIBE_UPDATE, if any.
    pub priority_override: Option<u8>,

    pub metrics: PublishTrackMetrics,
}

/// Engine-side state of one published track, shared between the
/// application's [Publication] handle and the session.
pub(crate) struct PublicationShared {
    pub config: PublishConfig,
    pub hash: TrackHash,
    pub handler: Arc<dyn PublishTrackHandler>,
    pub data_ctx_id: u64,
    pub state: Mutex<PublicationState>,
    pub queue: Arc<DataQueue>,
    pub session: Weak<SessionInner>,
}

impl PublicationShared {
    pub fn set_status(&self, status: PublishStatus) {
        self.state.lock().unwrap().status = status;
        self.handler.status_changed(status);
    }

    pub fn status(&self) -> PublishStatus {
        self.state.lock().unwrap().status
    }

    /// Frame one object per the track mode and hand it to the transport
    /// queue. Never blocks.
    pub fn publish_object(&self, headers: &ObjectHeaders, payload: Bytes) -> PublishObjectStatus {
        let mode = self.config.track_mode;

        let mut state = self.state.lock().unwrap();

        match state.status {
            PublishStatus::Ok => {}
            PublishStatus::NoSubscribers => {
                state.metrics.objects_dropped += 1;
                return PublishObjectStatus::NoSubscribers;
            }
            _ => {
                state.metrics.objects_dropped += 1;
                return PublishObjectStatus::NotAnnounced;
            }
        }
        if state.request_id.is_none() {
            state.metrics.objects_dropped += 1;
            return PublishObjectStatus::NoSubscribers;
        }

        let priority = state.priority_override.unwrap_or(headers.priority);
        let ttl_ms = headers.ttl_ms.unwrap_or(self.config.default_ttl_ms);
        let expires = match ttl_ms {
            0 => None,
            ttl => Some(Instant::now() + std::time::Duration::from_millis(ttl as u64)),
        };

        let payload_len = payload.len() as u64;

        match mode {
            TrackMode::Datagram => {
                // A status-only object uses the status datagram variants.
                let is_status = payload.is_empty() && headers.status != ObjectStatus::Available;
                let datagram_type = if is_status {
                    match headers.extensions.is_some() {
                        true => DatagramType::StatusWithExtensions,
                        false => DatagramType::StatusNoExtensions,
                    }
                } else {
                    DatagramType::for_object(headers.end_of_group, headers.extensions.is_some())
                };

                let datagram = ObjectDatagram {
                    datagram_type,
                    track_alias: state.track_alias,
                    group_id: headers.group_id,
                    object_id: headers.object_id,
                    priority,
                    extensions: headers.extensions.clone(),
                    status: is_status.then_some(headers.status),
                    payload: (!is_status).then_some(payload),
                };

                let mut buf = BytesMut::new();
                if let Err(err) = datagram.encode(&mut buf) {
                    log::error!("failed to encode datagram: {}", err);
                    return PublishObjectStatus::Ok;
                }
                self.queue.push(TxItem::Datagram {
                    bytes: buf.freeze(),
                    expires,
                });
            }
            TrackMode::StreamPerObject | TrackMode::StreamPerGroup | TrackMode::StreamPerTrack => {
                let new_group = state.current_group != Some(headers.group_id);
                let header_needed = match mode {
                    TrackMode::StreamPerObject => true,
                    TrackMode::StreamPerGroup => {
                        !state.stream_open || new_group || state.new_group_pending
                    }
                    _ => !state.stream_open,
                };

                if header_needed {
                    let header = SubgroupHeader {
                        header_type: StreamHeaderType::for_subgroup(
                            SubgroupIdKind::Explicit,
                            false,
                            headers.extensions.is_some(),
                        ),
                        track_alias: state.track_alias,
                        group_id: headers.group_id,
                        subgroup_id: Some(headers.subgroup_id.unwrap_or(0)),
                        priority,
                    };

                    let mut buf = BytesMut::new();
                    if let Err(err) = header.encode(&mut buf) {
                        log::error!("failed to encode subgroup header: {}", err);
                        return PublishObjectStatus::Ok;
                    }

                    // Dropping the queue is only correct for group mode; a
                    // new object stream must not cancel the previous object.
                    let clear = mode == TrackMode::StreamPerGroup && state.stream_open && new_group;

                    self.queue.push(TxItem::NewStream {
                        priority: priority as i32,
                        clear,
                        header: buf.freeze(),
                    });

                    state.stream_open = true;
                    state.stream_count += 1;
                    state.new_group_pending = false;
                    state.current_group = Some(headers.group_id);
                }

                let has_extensions = headers.extensions.is_some();
                let object = SubgroupObject {
                    object_id: headers.object_id,
                    extensions: headers.extensions.clone(),
                    // The record carries an explicit status when the payload
                    // is empty.
                    status: payload.is_empty().then_some(headers.status),
                    payload,
                };

                let mut buf = BytesMut::new();
                if let Err(err) = object.encode_ext(&mut buf, has_extensions) {
                    log::error!("failed to encode subgroup object: {}", err);
                    return PublishObjectStatus::Ok;
                }
                self.queue.push(TxItem::Data {
                    bytes: buf.freeze(),
                    expires,
                });
            }
        }

        state.metrics.objects_published += 1;
        state.metrics.bytes_published += payload_len;

        let location = headers.location();
        if state.largest.map_or(true, |largest| location > largest) {
            state.largest = Some(location);
        }
        drop(state);

        if let Some(session) = self.session.upgrade() {
            session.note_object_sent(payload_len);
        }

        PublishObjectStatus::Ok
    }
}

/// The application's handle to a published track.
///
/// Dropping the handle unpublishes the track.
pub struct Publication {
    pub(crate) shared: Arc<PublicationShared>,
    pub(crate) done: bool,
}

impl Publication {
    pub fn status(&self) -> PublishStatus {
        self.shared.status()
    }

    pub fn track_alias(&self) -> u64 {
        self.shared.state.lock().unwrap().track_alias
    }

    /// Publish one object. Returns synchronously; the transport write
    /// happens on the data-context writer.
    pub fn publish_object(&self, headers: &ObjectHeaders, payload: Bytes) -> PublishObjectStatus {
        self.shared.publish_object(headers, payload)
    }

    /// Stop publishing; sends PUBLISH_DONE for a bound subscriber and
    /// PUBLISH_NAMESPACE_DONE when this was the namespace's last track.
    pub fn unpublish(mut self) {
        self.unpublish_inner();
    }

    fn unpublish_inner(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        if let Some(session) = self.shared.session.upgrade() {
            session.unpublish(&self.shared);
        }
        self.shared.queue.push(TxItem::Close);
    }
}

impl Drop for Publication {
    fn drop(&mut self) {
        self.unpublish_inner();
    }
}

/// Drives one data context: pops queued items and writes them to the
/// transport, opening a fresh unidirectional stream on request.
pub(crate) async fn run_data_context(
    webtransport: web_transport::Session,
    queue: Arc<DataQueue>,
) -> Result<(), SessionError> {
    let mut current: Option<web_transport::SendStream> = None;

    loop {
        match queue.pop().await {
            TxItem::NewStream {
                priority,
                clear: _,
                header,
            } => {
                // Dropping the previous stream lets the transport reset it
                // rather than drain.
                current = None;

                let mut wt = webtransport.clone();
                let mut stream = wt.open_uni().await?;
                stream.set_priority(priority);
                write_all(&mut stream, header).await?;
                current = Some(stream);
            }
            TxItem::Data { bytes, expires } => {
                if expired(expires) {
                    log::trace!("dropping {} expired bytes", bytes.len());
                    continue;
                }
                match &mut current {
                    Some(stream) => write_all(stream, bytes).await?,
                    None => log::warn!("object record with no open stream, dropping"),
                }
            }
            TxItem::Datagram { bytes, expires } => {
                if expired(expires) {
                    continue;
                }
                webtransport.clone().send_datagram(bytes).await?;
            }
            TxItem::Close => return Ok(()),
        }
    }
}

fn expired(expires: Option<Instant>) -> bool {
    expires.is_some_and(|at| Instant::now() > at)
}

async fn write_all(
    stream: &mut web_transport::SendStream,
    mut bytes: Bytes,
) -> Result<(), SessionError> {
    while bytes.has_remaining() {
        stream.write_buf(&mut bytes).await?;
    }
    Ok(())
}

pub(crate) fn publish_done_message(request_id: u64, stream_count: u64) -> PublishDone {
    PublishDone {
        request_id,
        status_code: publish_done::TRACK_ENDED,
        stream_count,
        error_reason: "end of track".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::{Decode, FullTrackName};
    use futures::FutureExt;

    struct NoopHandler;
    impl PublishTrackHandler for NoopHandler {}

    fn shared(mode: TrackMode, status: PublishStatus, request_id: Option<u64>) -> PublicationShared {
        let ftn = FullTrackName::from_utf8_path("conf.example.com/conf/1", "alice/video");
        let hash = TrackHash::new(&ftn);
        let alias = hash.track_alias();

        PublicationShared {
            config: PublishConfig::new(ftn, mode),
            hash,
            handler: Arc::new(NoopHandler),
            data_ctx_id: 0,
            state: Mutex::new(PublicationState {
                status,
                request_id,
                track_alias: alias,
                current_group: None,
                stream_open: false,
                stream_count: 0,
                new_group_pending: false,
                largest: None,
                priority_override: None,
                metrics: Default::default(),
            }),
            queue: Arc::new(DataQueue::default()),
            session: Weak::new(),
        }
    }

    fn headers(group_id: u64, object_id: u64) -> ObjectHeaders {
        let mut headers = ObjectHeaders::new(group_id, object_id);
        headers.priority = 0xA;
        headers
    }

    fn pop(queue: &DataQueue) -> Option<TxItem> {
        queue.pop().now_or_never()
    }

    #[tokio::test]
    async fn publish_object_guard_rails() {
        // No announce yet
        let publication = shared(TrackMode::Datagram, PublishStatus::PendingAnnounceResponse, None);
        let status = publication.publish_object(&headers(0, 0), Bytes::from_static(b"x"));
        assert_eq!(status, PublishObjectStatus::NotAnnounced);
        assert_eq!(publication.state.lock().unwrap().metrics.objects_dropped, 1);

        // Announced, nobody subscribed
        let publication = shared(TrackMode::Datagram, PublishStatus::NoSubscribers, None);
        let status = publication.publish_object(&headers(0, 0), Bytes::from_static(b"x"));
        assert_eq!(status, PublishObjectStatus::NoSubscribers);

        // Announce accepted but the subscriber vanished before binding
        let publication = shared(TrackMode::Datagram, PublishStatus::Ok, None);
        let status = publication.publish_object(&headers(0, 0), Bytes::from_static(b"x"));
        assert_eq!(status, PublishObjectStatus::NoSubscribers);

        // Bound subscriber
        let publication = shared(TrackMode::Datagram, PublishStatus::Ok, Some(2));
        let status = publication.publish_object(&headers(0, 0), Bytes::from_static(b"x"));
        assert_eq!(status, PublishObjectStatus::Ok);

        let metrics = publication.state.lock().unwrap().metrics.clone();
        assert_eq!(metrics.objects_published, 1);
        assert_eq!(metrics.objects_dropped, 0);
    }

    #[tokio::test]
    async fn datagram_framing() {
        let publication = shared(TrackMode::Datagram, PublishStatus::Ok, Some(2));
        let alias = publication.state.lock().unwrap().track_alias;

        let status =
            publication.publish_object(&headers(0x1000, 0xFF), Bytes::from_static(b"payload"));
        assert_eq!(status, PublishObjectStatus::Ok);

        let Some(TxItem::Datagram { mut bytes, .. }) = pop(&publication.queue) else {
            panic!("expected a datagram item");
        };
        let decoded = ObjectDatagram::decode(&mut bytes).unwrap();
        assert_eq!(decoded.track_alias, alias);
        assert_eq!(decoded.group_id, 0x1000);
        assert_eq!(decoded.object_id, 0xFF);
        assert_eq!(decoded.payload.unwrap(), Bytes::from_static(b"payload"));
        assert!(pop(&publication.queue).is_none());
    }

    #[tokio::test]
    async fn group_mode_reuses_stream_within_group() {
        let publication = shared(TrackMode::StreamPerGroup, PublishStatus::Ok, Some(2));

        publication.publish_object(&headers(0, 0), Bytes::from_static(b"a"));
        publication.publish_object(&headers(0, 1), Bytes::from_static(b"b"));

        // One header for the group, then two object records.
        let Some(TxItem::NewStream { mut header, .. }) = pop(&publication.queue) else {
            panic!("expected a stream header");
        };
        let decoded = SubgroupHeader::decode(&mut header).unwrap();
        assert_eq!(decoded.group_id, 0);

        assert!(matches!(pop(&publication.queue), Some(TxItem::Data { .. })));
        assert!(matches!(pop(&publication.queue), Some(TxItem::Data { .. })));
        assert!(pop(&publication.queue).is_none());
        assert_eq!(publication.state.lock().unwrap().stream_count, 1);
    }

    #[tokio::test]
    async fn new_group_clears_pending_queue() {
        let publication = shared(TrackMode::StreamPerGroup, PublishStatus::Ok, Some(2));

        publication.publish_object(&headers(0, 0), Bytes::from_static(b"a"));
        publication.publish_object(&headers(0, 1), Bytes::from_static(b"b"));
        // Nothing drained yet; a new group drops the stale items.
        publication.publish_object(&headers(1, 0), Bytes::from_static(b"c"));

        let Some(TxItem::NewStream { mut header, clear, .. }) = pop(&publication.queue) else {
            panic!("expected a stream header");
        };
        assert!(clear);
        let decoded = SubgroupHeader::decode(&mut header).unwrap();
        assert_eq!(decoded.group_id, 1);

        assert!(matches!(pop(&publication.queue), Some(TxItem::Data { .. })));
        assert!(pop(&publication.queue).is_none());
    }

    #[tokio::test]
    async fn per_object_mode_opens_stream_per_object() {
        let publication = shared(TrackMode::StreamPerObject, PublishStatus::Ok, Some(2));

        publication.publish_object(&headers(0, 0), Bytes::from_static(b"a"));
        publication.publish_object(&headers(0, 1), Bytes::from_static(b"b"));

        // Header + record, twice; a new object stream never clears pending.
        for _ in 0..2 {
            let Some(TxItem::NewStream { clear, .. }) = pop(&publication.queue) else {
                panic!("expected a stream header");
            };
            assert!(!clear);
            assert!(matches!(pop(&publication.queue), Some(TxItem::Data { .. })));
        }
        assert!(pop(&publication.queue).is_none());
    }

    #[tokio::test]
    async fn track_mode_single_stream() {
        let publication = shared(TrackMode::StreamPerTrack, PublishStatus::Ok, Some(2));

        publication.publish_object(&headers(0, 0), Bytes::from_static(b"a"));
        publication.publish_object(&headers(1, 0), Bytes::from_static(b"b"));

        // One header for the whole track, even across groups.
        assert!(matches!(
            pop(&publication.queue),
            Some(TxItem::NewStream { .. })
        ));
        assert!(matches!(pop(&publication.queue), Some(TxItem::Data { .. })));
        assert!(matches!(pop(&publication.queue), Some(TxItem::Data { .. })));
        assert!(pop(&publication.queue).is_none());
    }

    #[tokio::test]
    async fn largest_location_tracks_maximum() {
        let publication = shared(TrackMode::Datagram, PublishStatus::Ok, Some(2));

        publication.publish_object(&headers(2, 5), Bytes::from_static(b"a"));
        publication.publish_object(&headers(1, 9), Bytes::from_static(b"b"));

        let largest = publication.state.lock().unwrap().largest;
        assert_eq!(largest, Some(crate::coding::Location::new(2, 5)));
    }
}
