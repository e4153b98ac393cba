//! The per-connection protocol engine: setup negotiation, the control
//! stream, the track registries and the object dispatcher.

mod client;
mod config;
mod data_stream;
mod error;
mod publication;
mod server;
mod subscription;

pub use client::*;
pub use config::*;
pub use error::*;
pub use publication::Publication;
pub use server::*;
pub use subscription::*;

pub(crate) use publication::{
    publish_done_message, run_data_context, DataQueue, PublicationShared, PublicationState, TxItem,
};

use crate::coding::{namespace_hash, Encode, FullTrackName, StreamBuffer, TrackHash};
use crate::message::{self, error_code, ControlMessage, FilterType, GroupOrder};
use crate::setup;
use crate::track::{
    ConnectionMetrics, FetchConfig, FetchKind, ObjectHeaders, PublishConfig, PublishStatus,
    PublishTrackHandler, SessionHandler, SessionStatus, SubscribeConfig, SubscribeStatus,
    SubscribeTrackHandler, SubscribeTrackMetrics,
};

use bytes::{Buf, Bytes, BytesMut};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Cap on control messages processed per read wakeup, so one connection
/// cannot starve the rest of the runtime.
const CTRL_MESSAGE_BATCH: usize = 16;

pub(crate) struct SubscriptionEntry {
    pub handler: Arc<dyn SubscribeTrackHandler>,
    pub status: SubscribeStatus,
    pub track_alias: Option<u64>,
    pub is_fetch: bool,
    pub metrics: SubscribeTrackMetrics,
}

/// Everything behind the connection's state mutex.
pub(crate) struct SessionState {
    pub status: SessionStatus,
    pub version: Option<setup::Version>,

    /// Next locally allocated request id; strictly monotonic.
    pub next_request_id: u64,
    /// The peer's MAX_REQUEST_ID grant.
    pub peer_max_request_id: u64,

    /// Subscriptions and fetches by locally allocated request id.
    pub subscriptions: HashMap<u64, SubscriptionEntry>,
    /// Data routing: track alias to subscription request id.
    pub tracks_by_alias: HashMap<u64, u64>,

    /// Publications by namespace hash, then name hash.
    pub publications: HashMap<u64, HashMap<u64, Arc<PublicationShared>>>,
    /// Track alias to (namespace hash, name hash) for published tracks.
    pub pub_by_alias: HashMap<u64, (u64, u64)>,
    /// Data context id to (namespace hash, name hash).
    pub data_contexts: HashMap<u64, (u64, u64)>,
    pub next_data_ctx_id: u64,

    /// (namespace hash, name hash) behind each subscribe id the peer sent
    /// us for our published tracks.
    pub recv_sub_id: HashMap<u64, (u64, u64)>,

    pub metrics: ConnectionMetrics,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::NotReady,
            version: None,
            next_request_id: 0,
            peer_max_request_id: u64::MAX,
            subscriptions: HashMap::new(),
            tracks_by_alias: HashMap::new(),
            publications: HashMap::new(),
            pub_by_alias: HashMap::new(),
            data_contexts: HashMap::new(),
            next_data_ctx_id: 0,
            recv_sub_id: HashMap::new(),
            metrics: ConnectionMetrics::default(),
        }
    }

    fn publication(&self, namespace_hash: u64, name_hash: u64) -> Option<Arc<PublicationShared>> {
        self.publications
            .get(&namespace_hash)
            .and_then(|tracks| tracks.get(&name_hash))
            .cloned()
    }
}

pub(crate) struct SessionInner {
    pub webtransport: web_transport::Session,
    pub client_mode: bool,
    pub endpoint_id: String,
    pub metrics_sample_ms: u32,
    pub handler: Arc<dyn SessionHandler>,
    pub runtime: tokio::runtime::Handle,
    outgoing: mpsc::UnboundedSender<ControlMessage>,
    pub state: Mutex<SessionState>,
}

/// The application's handle to a connection.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<SessionInner>,
}

/// The engine for one connection; `run()` drives it until the connection
/// dies.
#[must_use = "run() must be called"]
pub struct Session {
    inner: Arc<SessionInner>,
    control_send: web_transport::SendStream,
    control_recv: web_transport::RecvStream,
    control_buffer: StreamBuffer,
    outgoing: mpsc::UnboundedReceiver<ControlMessage>,
}

impl Session {
    /// Client side: open the control stream and negotiate setup.
    pub(crate) async fn connect(
        mut webtransport: web_transport::Session,
        endpoint_id: String,
        metrics_sample_ms: u32,
        handler: Arc<dyn SessionHandler>,
    ) -> Result<(Session, Endpoint), SessionError> {
        handler.status_changed(SessionStatus::Connecting);
        let (mut send, mut recv) = webtransport.open_bi().await?;

        let mut params = crate::coding::Parameters::default();
        params.set_bytes(
            setup::setup_parameter::ENDPOINT_ID,
            endpoint_id.clone().into_bytes(),
        );

        let client = setup::ClientSetup {
            supported_versions: [setup::Version::DRAFT_14].into(),
            setup_parameters: params,
        };
        log::debug!("sending CLIENT_SETUP: {:?}", client);
        write_message(&mut send, &client).await?;

        let mut buffer = StreamBuffer::new();
        let server: setup::ServerSetup = read_message(&mut recv, &mut buffer).await?;
        log::debug!("received SERVER_SETUP: {:?}", server);

        if server.selected_version != setup::Version::DRAFT_14 {
            return Err(SessionError::Version(
                [server.selected_version].into(),
                [setup::Version::DRAFT_14].into(),
            ));
        }

        let session = Session::build(
            webtransport,
            send,
            recv,
            buffer,
            true,
            endpoint_id,
            metrics_sample_ms,
            handler,
            server.selected_version,
            server
                .setup_parameters
                .get_int(setup::setup_parameter::MAX_REQUEST_ID),
        );
        Ok(session)
    }

    /// Server side: accept the control stream and negotiate setup.
    pub(crate) async fn accept(
        mut webtransport: web_transport::Session,
        endpoint_id: String,
        metrics_sample_ms: u32,
        handler: Arc<dyn SessionHandler>,
    ) -> Result<(Session, Endpoint), SessionError> {
        handler.status_changed(SessionStatus::Connecting);
        let (mut send, mut recv) = webtransport.accept_bi().await?;

        let mut buffer = StreamBuffer::new();
        let client: setup::ClientSetup = read_message(&mut recv, &mut buffer).await?;
        log::debug!("received CLIENT_SETUP: {:?}", client);

        if client.supported_versions.is_empty() {
            return Err(SessionError::ProtocolViolation);
        }
        if !client.supported_versions.contains(&setup::Version::DRAFT_14) {
            return Err(SessionError::Version(
                client.supported_versions,
                [setup::Version::DRAFT_14].into(),
            ));
        }

        let server = setup::ServerSetup {
            selected_version: setup::Version::DRAFT_14,
            setup_parameters: Default::default(),
        };
        log::debug!("sending SERVER_SETUP: {:?}", server);
        write_message(&mut send, &server).await?;

        let session = Session::build(
            webtransport,
            send,
            recv,
            buffer,
            false,
            endpoint_id,
            metrics_sample_ms,
            handler,
            setup::Version::DRAFT_14,
            client
                .setup_parameters
                .get_int(setup::setup_parameter::MAX_REQUEST_ID),
        );
        Ok(session)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        webtransport: web_transport::Session,
        control_send: web_transport::SendStream,
        control_recv: web_transport::RecvStream,
        control_buffer: StreamBuffer,
        client_mode: bool,
        endpoint_id: String,
        metrics_sample_ms: u32,
        handler: Arc<dyn SessionHandler>,
        version: setup::Version,
        peer_max_request_id: Option<u64>,
    ) -> (Session, Endpoint) {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

        let mut state = SessionState::new();
        state.status = SessionStatus::Ready;
        state.version = Some(version);
        if let Some(max) = peer_max_request_id {
            state.peer_max_request_id = max;
        }

        let inner = Arc::new(SessionInner {
            webtransport,
            client_mode,
            endpoint_id,
            metrics_sample_ms,
            handler: handler.clone(),
            runtime: tokio::runtime::Handle::current(),
            outgoing: outgoing_tx,
            state: Mutex::new(state),
        });

        handler.status_changed(SessionStatus::Ready);

        let session = Session {
            inner: inner.clone(),
            control_send,
            control_recv,
            control_buffer,
            outgoing: outgoing_rx,
        };
        (session, Endpoint { inner })
    }

    /// Drive the connection until it fails or the peer closes.
    pub async fn run(self) -> Result<(), SessionError> {
        let inner = self.inner;

        let res = tokio::select! {
            res = Self::run_send(self.control_send, self.outgoing, inner.clone()) => res,
            res = Self::run_recv(self.control_recv, self.control_buffer, inner.clone()) => res,
            res = data_stream::run_streams(inner.clone()) => res,
            res = data_stream::run_datagrams(inner.clone()) => res,
            res = Self::run_metrics(inner.clone()) => res,
        };

        if let Err(err) = &res {
            log::warn!("session terminated: {}", err);
            inner.close(err);
        }
        inner.disconnected();

        res
    }

    async fn run_send(
        mut stream: web_transport::SendStream,
        mut outgoing: mpsc::UnboundedReceiver<ControlMessage>,
        inner: Arc<SessionInner>,
    ) -> Result<(), SessionError> {
        while let Some(msg) = outgoing.recv().await {
            log::debug!("sending control message: {:?}", msg);

            let mut buf = BytesMut::new();
            msg.encode(&mut buf)?;

            {
                let mut state = inner.state.lock().unwrap();
                state.metrics.ctrl_messages_sent += 1;
                state.metrics.bytes_sent += buf.len() as u64;
            }

            let mut buf = buf.freeze();
            while buf.has_remaining() {
                stream.write_buf(&mut buf).await?;
            }
        }

        Ok(())
    }

    async fn run_recv(
        mut stream: web_transport::RecvStream,
        mut sbuf: StreamBuffer,
        inner: Arc<SessionInner>,
    ) -> Result<(), SessionError> {
        let mut chunk = BytesMut::new();

        loop {
            // Drain buffered messages, yielding between batches so one busy
            // peer cannot monopolize the task.
            loop {
                let mut drained = 0;
                while drained < CTRL_MESSAGE_BATCH {
                    match sbuf.try_decode::<ControlMessage>() {
                        Ok(Some(msg)) => {
                            inner.recv_message(msg)?;
                            drained += 1;
                        }
                        Ok(None) => break,
                        Err(err) => return Err(err.into()),
                    }
                }
                if drained < CTRL_MESSAGE_BATCH {
                    break;
                }
                tokio::task::yield_now().await;
            }

            if !stream.read_buf(&mut chunk).await? {
                // Peer closed the control stream.
                return Err(SessionError::NotConnected);
            }
            inner.state.lock().unwrap().metrics.bytes_received += chunk.len() as u64;
            sbuf.push(&chunk);
            chunk.clear();
        }
    }

    async fn run_metrics(inner: Arc<SessionInner>) -> Result<(), SessionError> {
        let period = std::time::Duration::from_millis(inner.metrics_sample_ms.max(1) as u64);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let (connection, subscriptions, publications) = {
                let state = inner.state.lock().unwrap();
                let subscriptions: Vec<_> = state
                    .subscriptions
                    .values()
                    .map(|entry| (entry.handler.clone(), entry.metrics.clone()))
                    .collect();
                let publications: Vec<_> = state
                    .publications
                    .values()
                    .flat_map(|tracks| tracks.values())
                    .map(|shared| {
                        (
                            shared.handler.clone(),
                            shared.state.lock().unwrap().metrics.clone(),
                        )
                    })
                    .collect();
                (state.metrics.clone(), subscriptions, publications)
            };

            inner.handler.metrics_sampled(&connection);
            for (handler, metrics) in subscriptions {
                handler.metrics_sampled(&metrics);
            }
            for (handler, metrics) in publications {
                handler.metrics_sampled(&metrics);
            }
        }
    }
}

impl Endpoint {
    pub fn status(&self) -> SessionStatus {
        self.inner.state.lock().unwrap().status
    }

    /// The locally configured endpoint identifier sent during setup.
    pub fn endpoint_id(&self) -> &str {
        &self.inner.endpoint_id
    }

    pub fn is_client(&self) -> bool {
        self.inner.client_mode
    }

    /// The protocol version selected during setup.
    pub fn version(&self) -> Option<setup::Version> {
        self.inner.state.lock().unwrap().version
    }

    /// Subscribe to a track; objects arrive via the handler callbacks.
    pub fn subscribe_track(
        &self,
        config: SubscribeConfig,
        handler: Arc<dyn SubscribeTrackHandler>,
    ) -> Result<Subscription, SessionError> {
        if config.filter_type.has_start() && config.start_location.is_none() {
            return Err(SessionError::Encode(
                crate::coding::EncodeError::MissingField("StartLocation".to_string()),
            ));
        }
        if config.filter_type.has_end() && config.end_group.is_none() {
            return Err(SessionError::Encode(
                crate::coding::EncodeError::MissingField("EndGroup".to_string()),
            ));
        }

        let request_id = {
            let mut state = self.inner.state.lock().unwrap();
            if state.status != SessionStatus::Ready {
                return Err(SessionError::NotConnected);
            }
            let request_id = self.inner.allocate_request_id(&mut state)?;

            state.subscriptions.insert(
                request_id,
                SubscriptionEntry {
                    handler: handler.clone(),
                    status: SubscribeStatus::PendingResponse,
                    track_alias: None,
                    is_fetch: false,
                    metrics: SubscribeTrackMetrics::default(),
                },
            );
            request_id
        };

        handler.status_changed(SubscribeStatus::PendingResponse);

        self.inner.send_message(message::Subscribe {
            request_id,
            track_namespace: config.full_track_name.namespace.clone(),
            track_name: config.full_track_name.name.clone(),
            subscriber_priority: config.priority,
            group_order: config.group_order,
            forward: true,
            filter_type: config.filter_type,
            start_location: config.start_location,
            end_group: config.end_group,
            params: Default::default(),
        });

        Ok(Subscription {
            session: Arc::downgrade(&self.inner),
            request_id,
            done: false,
        })
    }

    /// Publish a track. The namespace is announced if this is its first
    /// track; objects flow once a subscriber is bound.
    pub fn publish_track(
        &self,
        config: PublishConfig,
        handler: Arc<dyn PublishTrackHandler>,
    ) -> Result<Publication, SessionError> {
        let shared = self.inner.install_publication(
            config,
            handler.clone(),
            PublishStatus::PendingAnnounceResponse,
            None,
        )?;

        handler.status_changed(PublishStatus::PendingAnnounceResponse);
        Ok(Publication {
            shared,
            done: false,
        })
    }

    /// Server side: bind a publication to a SUBSCRIBE the application
    /// accepted via
    /// [crate::track::SessionHandler::subscribe_received].
    pub fn bind_publisher_track(
        &self,
        request_id: u64,
        config: PublishConfig,
        handler: Arc<dyn PublishTrackHandler>,
    ) -> Result<Publication, SessionError> {
        let shared = self.inner.install_publication(
            config,
            handler.clone(),
            PublishStatus::Ok,
            Some(request_id),
        )?;

        {
            let state = shared.state.lock().unwrap();
            self.inner.send_message(message::SubscribeOk {
                request_id,
                track_alias: state.track_alias,
                expires: 0,
                group_order: GroupOrder::Ascending,
                content_exists: state.largest.is_some(),
                largest_location: state.largest,
                params: Default::default(),
            });
        }

        handler.status_changed(PublishStatus::Ok);
        Ok(Publication {
            shared,
            done: false,
        })
    }

    /// Fetch a range of already published objects; they arrive via the
    /// handler like subscribed objects, identified by the fetch request id.
    pub fn fetch_track(
        &self,
        config: FetchConfig,
        handler: Arc<dyn SubscribeTrackHandler>,
    ) -> Result<FetchRequest, SessionError> {
        let request_id = {
            let mut state = self.inner.state.lock().unwrap();
            if state.status != SessionStatus::Ready {
                return Err(SessionError::NotConnected);
            }
            let request_id = self.inner.allocate_request_id(&mut state)?;

            state.subscriptions.insert(
                request_id,
                SubscriptionEntry {
                    handler: handler.clone(),
                    status: SubscribeStatus::PendingResponse,
                    track_alias: None,
                    is_fetch: true,
                    metrics: SubscribeTrackMetrics::default(),
                },
            );
            request_id
        };

        handler.status_changed(SubscribeStatus::PendingResponse);

        let (fetch_type, standalone, joining) = match config.kind {
            FetchKind::Standalone {
                full_track_name,
                start_location,
                end_location,
            } => (
                message::FetchType::Standalone,
                Some(message::StandaloneFetch {
                    track_namespace: full_track_name.namespace,
                    track_name: full_track_name.name,
                    start_location,
                    end_location,
                }),
                None,
            ),
            FetchKind::Joining {
                joining_request_id,
                joining_start,
            } => (
                message::FetchType::Joining,
                None,
                Some(message::JoiningFetch {
                    joining_request_id,
                    joining_start,
                }),
            ),
        };

        self.inner.send_message(message::Fetch {
            request_id,
            subscriber_priority: config.priority,
            group_order: config.group_order,
            fetch_type,
            standalone,
            joining,
            params: Default::default(),
        });

        Ok(FetchRequest {
            session: Arc::downgrade(&self.inner),
            request_id,
            done: false,
        })
    }

    /// Query a track's status; the answer arrives via
    /// [crate::track::SessionHandler::track_status_received].
    pub fn request_track_status(&self, ftn: &FullTrackName) -> Result<u64, SessionError> {
        let request_id = {
            let mut state = self.inner.state.lock().unwrap();
            if state.status != SessionStatus::Ready {
                return Err(SessionError::NotConnected);
            }
            self.inner.allocate_request_id(&mut state)?
        };

        self.inner.send_message(message::TrackStatus {
            request_id,
            track_namespace: ftn.namespace.clone(),
            track_name: ftn.name.clone(),
            subscriber_priority: 128,
            group_order: GroupOrder::Publisher,
            forward: false,
            filter_type: FilterType::LatestObject,
            start_location: None,
            end_group: None,
            params: Default::default(),
        });

        Ok(request_id)
    }

    /// Close the connection; every handler observes NotConnected.
    pub fn disconnect(&self) {
        self.inner.close(&SessionError::NotConnected);
        self.inner.disconnected();
    }
}

impl SessionInner {
    pub(crate) fn send_message<M: Into<ControlMessage>>(&self, msg: M) {
        let msg = msg.into();
        if self.outgoing.send(msg).is_err() {
            log::warn!("control queue closed, dropping outbound message");
        }
    }

    pub(crate) fn close(&self, err: &SessionError) {
        let mut wt = self.webtransport.clone();
        wt.close(err.code() as u32, &err.to_string());
    }

    fn allocate_request_id(&self, state: &mut SessionState) -> Result<u64, SessionError> {
        if state.next_request_id >= state.peer_max_request_id {
            self.send_message(message::RequestsBlocked {
                maximum_request_id: state.peer_max_request_id,
            });
            return Err(SessionError::TooManyRequests);
        }
        let id = state.next_request_id;
        state.next_request_id += 1;
        Ok(id)
    }

    /// Create the engine-side state for a publication and its data-context
    /// writer; announces the namespace when it is new.
    fn install_publication(
        self: &Arc<Self>,
        config: PublishConfig,
        handler: Arc<dyn PublishTrackHandler>,
        status: PublishStatus,
        request_id: Option<u64>,
    ) -> Result<Arc<PublicationShared>, SessionError> {
        let hash = TrackHash::new(&config.full_track_name);
        let alias = config
            .full_track_name
            .alias
            .unwrap_or_else(|| hash.track_alias());

        let (shared, announce) = {
            let mut state = self.state.lock().unwrap();
            if state.status != SessionStatus::Ready {
                return Err(SessionError::NotConnected);
            }

            if state.publication(hash.namespace_hash, hash.name_hash).is_some() {
                return Err(SessionError::DuplicateTrack);
            }
            if state.pub_by_alias.contains_key(&alias) {
                return Err(SessionError::DuplicateTrackAlias);
            }

            let announce = !state.publications.contains_key(&hash.namespace_hash);

            let data_ctx_id = state.next_data_ctx_id;
            state.next_data_ctx_id += 1;

            let shared = Arc::new(PublicationShared {
                config,
                hash,
                handler,
                data_ctx_id,
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
                session: Arc::downgrade(self),
            });

            state
                .publications
                .entry(hash.namespace_hash)
                .or_default()
                .insert(hash.name_hash, shared.clone());
            state.pub_by_alias.insert(alias, (hash.namespace_hash, hash.name_hash));
            state
                .data_contexts
                .insert(data_ctx_id, (hash.namespace_hash, hash.name_hash));
            if let Some(request_id) = request_id {
                state
                    .recv_sub_id
                    .insert(request_id, (hash.namespace_hash, hash.name_hash));
            }

            (shared, announce)
        };

        let queue = shared.queue.clone();
        let webtransport = self.webtransport.clone();
        self.runtime.spawn(async move {
            if let Err(err) = run_data_context(webtransport, queue).await {
                log::warn!("data context writer failed: {}", err);
            }
        });

        if announce && request_id.is_none() {
            self.send_message(message::PublishNamespace {
                track_namespace: shared.config.full_track_name.namespace.clone(),
                params: Default::default(),
            });
        }

        Ok(shared)
    }

    /// Remove a publication, emitting PUBLISH_DONE for a bound subscriber
    /// and PUBLISH_NAMESPACE_DONE when the namespace empties.
    pub(crate) fn unpublish(&self, shared: &Arc<PublicationShared>) {
        shared.set_status(PublishStatus::SendingUnannounce);

        let hash = shared.hash;
        let mut done_msg = None;
        let mut unannounce = None;

        {
            let mut state = self.state.lock().unwrap();

            {
                let pub_state = shared.state.lock().unwrap();
                if let Some(request_id) = pub_state.request_id {
                    done_msg = Some(publish_done_message(request_id, pub_state.stream_count));
                    state.recv_sub_id.remove(&request_id);
                }
                state.pub_by_alias.remove(&pub_state.track_alias);
            }

            state.data_contexts.remove(&shared.data_ctx_id);
            if let Some(tracks) = state.publications.get_mut(&hash.namespace_hash) {
                tracks.remove(&hash.name_hash);
                if tracks.is_empty() {
                    state.publications.remove(&hash.namespace_hash);
                    unannounce = Some(shared.config.full_track_name.namespace.clone());
                }
            }
        }

        if let Some(msg) = done_msg {
            self.send_message(msg);
        }
        if let Some(track_namespace) = unannounce {
            self.send_message(message::PublishNamespaceDone { track_namespace });
        }

        shared.set_status(PublishStatus::NotAnnounced);
    }

    pub(crate) fn note_object_sent(&self, bytes: u64) {
        let mut state = self.state.lock().unwrap();
        state.metrics.objects_sent += 1;
        state.metrics.bytes_sent += bytes;
    }

    pub(crate) fn subscription_status(&self, request_id: u64) -> SubscribeStatus {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .get(&request_id)
            .map(|entry| entry.status)
            .unwrap_or(SubscribeStatus::NotSubscribed)
    }

    pub(crate) fn subscription_alias(&self, request_id: u64) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .get(&request_id)
            .and_then(|entry| entry.track_alias)
    }

    pub(crate) fn set_subscription_status(&self, request_id: u64, status: SubscribeStatus) {
        let handler = {
            let mut state = self.state.lock().unwrap();
            match state.subscriptions.get_mut(&request_id) {
                Some(entry) => {
                    entry.status = status;
                    entry.handler.clone()
                }
                None => return,
            }
        };
        handler.status_changed(status);
    }

    pub(crate) fn remove_subscription(&self, request_id: u64, status: SubscribeStatus) {
        let handler = {
            let mut state = self.state.lock().unwrap();
            let entry = match state.subscriptions.remove(&request_id) {
                Some(entry) => entry,
                None => return,
            };
            if let Some(alias) = entry.track_alias {
                state.tracks_by_alias.remove(&alias);
            }
            entry.handler
        };
        handler.status_changed(status);
    }

    /// Deliver an inbound object to the subscription behind a track alias.
    pub(crate) fn deliver_object_by_alias(&self, alias: u64, headers: ObjectHeaders, payload: Bytes) {
        let request_id = {
            let state = self.state.lock().unwrap();
            state.tracks_by_alias.get(&alias).copied()
        };

        match request_id {
            Some(request_id) => self.deliver_object_by_request(request_id, headers, payload),
            None => {
                let mut state = self.state.lock().unwrap();
                state.metrics.unknown_objects_dropped += 1;
                log::warn!("object for unknown track alias {}, dropping", alias);
            }
        }
    }

    /// Deliver an inbound object to the subscription or fetch behind a
    /// request id.
    pub(crate) fn deliver_object_by_request(
        &self,
        request_id: u64,
        headers: ObjectHeaders,
        payload: Bytes,
    ) {
        let handler = {
            let mut state = self.state.lock().unwrap();
            state.metrics.objects_received += 1;

            match state.subscriptions.get_mut(&request_id) {
                Some(entry) => {
                    entry.metrics.objects_received += 1;
                    entry.metrics.bytes_received += payload.len() as u64;
                    entry.handler.clone()
                }
                None => {
                    state.metrics.unknown_objects_dropped += 1;
                    log::warn!("object for unknown request id {}, dropping", request_id);
                    return;
                }
            }
        };

        handler.object_received(headers, payload);
    }

    /// Tear down every handler when the connection dies.
    pub(crate) fn disconnected(&self) {
        let (status_known, subscriptions, publications) = {
            let mut state = self.state.lock().unwrap();
            let already = state.status == SessionStatus::NotConnected;
            state.status = SessionStatus::NotConnected;

            let subscriptions: Vec<_> = state
                .subscriptions
                .drain()
                .map(|(_, entry)| entry.handler)
                .collect();
            let publications: Vec<_> = state
                .publications
                .drain()
                .flat_map(|(_, tracks)| tracks.into_values())
                .collect();
            state.tracks_by_alias.clear();
            state.pub_by_alias.clear();
            state.data_contexts.clear();
            state.recv_sub_id.clear();

            (already, subscriptions, publications)
        };

        if status_known {
            return;
        }

        for handler in subscriptions {
            handler.status_changed(SubscribeStatus::NotConnected);
        }
        for shared in publications {
            shared.queue.push(TxItem::Close);
            shared.set_status(PublishStatus::NotConnected);
        }
        self.handler.status_changed(SessionStatus::NotConnected);
    }

    // ---------------------------------------------------------------------
    // Control message dispatch
    // ---------------------------------------------------------------------

    fn recv_message(&self, msg: ControlMessage) -> Result<(), SessionError> {
        log::debug!("received control message: {:?}", msg);
        self.state.lock().unwrap().metrics.ctrl_messages_received += 1;

        match msg {
            ControlMessage::Subscribe(msg) => self.recv_subscribe(msg),
            ControlMessage::SubscribeOk(msg) => self.recv_subscribe_ok(msg),
            ControlMessage::SubscribeError(msg) => self.recv_subscribe_error(msg),
            ControlMessage::SubscribeUpdate(msg) => self.recv_subscribe_update(msg),
            ControlMessage::Unsubscribe(msg) => self.recv_unsubscribe(msg),
            ControlMessage::PublishDone(msg) => self.recv_publish_done(msg),
            ControlMessage::PublishNamespace(msg) => self.recv_publish_namespace(msg),
            ControlMessage::PublishNamespaceOk(msg) => self.recv_publish_namespace_ok(msg),
            ControlMessage::PublishNamespaceError(msg) => self.recv_publish_namespace_error(msg),
            ControlMessage::PublishNamespaceDone(msg) => {
                log::info!(
                    "peer withdrew namespace {}",
                    msg.track_namespace.to_utf8_path()
                );
                Ok(())
            }
            ControlMessage::PublishNamespaceCancel(msg) => self.recv_publish_namespace_cancel(msg),
            ControlMessage::Publish(msg) => {
                // Push-mode publish is not served here; decline politely.
                log::warn!("PUBLISH not supported, rejecting request {}", msg.request_id);
                self.send_message(message::PublishError {
                    request_id: msg.request_id,
                    error_code: error_code::subscribe_error::NOT_SUPPORTED,
                    error_reason: "not supported".into(),
                });
                Ok(())
            }
            ControlMessage::PublishOk(msg) => {
                log::warn!("unexpected PUBLISH_OK for request {}, dropping", msg.request_id);
                Ok(())
            }
            ControlMessage::PublishError(msg) => {
                log::warn!(
                    "unexpected PUBLISH_ERROR for request {}, dropping",
                    msg.request_id
                );
                Ok(())
            }
            ControlMessage::TrackStatus(msg) => self.recv_track_status(msg),
            ControlMessage::TrackStatusOk(msg) => {
                self.handler
                    .track_status_received(msg.request_id, msg.largest_location);
                Ok(())
            }
            ControlMessage::TrackStatusError(msg) => {
                self.handler.track_status_received(msg.request_id, None);
                Ok(())
            }
            ControlMessage::SubscribeNamespace(msg) => self.recv_subscribe_namespace(msg),
            ControlMessage::SubscribeNamespaceOk(msg) => {
                log::debug!("namespace subscription {} accepted", msg.request_id);
                Ok(())
            }
            ControlMessage::SubscribeNamespaceError(msg) => {
                log::warn!(
                    "namespace subscription {} rejected: {}",
                    msg.request_id,
                    msg.error_reason.0
                );
                Ok(())
            }
            ControlMessage::UnsubscribeNamespace(msg) => {
                log::debug!(
                    "peer unsubscribed namespace prefix {}",
                    msg.track_namespace_prefix.to_utf8_path()
                );
                Ok(())
            }
            ControlMessage::Fetch(msg) => {
                // Serving fetches requires object retention, which this
                // endpoint does not keep.
                log::warn!("FETCH not served, rejecting request {}", msg.request_id);
                self.send_message(message::FetchError {
                    request_id: msg.request_id,
                    error_code: error_code::fetch_error::NOT_SUPPORTED,
                    error_reason: "no object cache".into(),
                });
                Ok(())
            }
            ControlMessage::FetchCancel(msg) => {
                log::debug!("peer canceled fetch {}", msg.request_id);
                Ok(())
            }
            ControlMessage::FetchOk(msg) => self.recv_fetch_ok(msg),
            ControlMessage::FetchError(msg) => self.recv_fetch_error(msg),
            ControlMessage::MaxRequestId(msg) => {
                let mut state = self.state.lock().unwrap();
                if msg.request_id > state.peer_max_request_id {
                    state.peer_max_request_id = msg.request_id;
                }
                Ok(())
            }
            ControlMessage::RequestsBlocked(msg) => {
                log::warn!("peer blocked on request limit {}", msg.maximum_request_id);
                Ok(())
            }
            ControlMessage::GoAway(msg) => {
                self.handler.goaway_received(&msg.new_session_uri.0);
                Ok(())
            }
            ControlMessage::NewGroupRequest(msg) => self.recv_new_group_request(msg),
        }
    }

    fn recv_subscribe(&self, msg: message::Subscribe) -> Result<(), SessionError> {
        let ftn = FullTrackName::new(msg.track_namespace.clone(), msg.track_name.clone());
        let hash = TrackHash::new(&ftn);

        let publication = {
            let state = self.state.lock().unwrap();
            state.publication(hash.namespace_hash, hash.name_hash)
        };

        let Some(shared) = publication else {
            // Give the application a chance to bind a publisher.
            if self
                .handler
                .subscribe_received(&msg.track_namespace, &msg.track_name, msg.request_id)
            {
                return Ok(());
            }

            log::info!(
                "subscribe for unknown track {}/{:?}",
                msg.track_namespace.to_utf8_path(),
                msg.track_name
            );
            self.send_message(message::SubscribeError {
                request_id: msg.request_id,
                error_code: error_code::subscribe_error::TRACK_DOES_NOT_EXIST,
                error_reason: "track does not exist".into(),
            });
            return Ok(());
        };

        let (track_alias, largest) = {
            let mut state = self.state.lock().unwrap();
            let mut pub_state = shared.state.lock().unwrap();

            pub_state.request_id = Some(msg.request_id);
            pub_state.priority_override = Some(msg.subscriber_priority);
            state
                .recv_sub_id
                .insert(msg.request_id, (hash.namespace_hash, hash.name_hash));

            (pub_state.track_alias, pub_state.largest)
        };

        self.send_message(message::SubscribeOk {
            request_id: msg.request_id,
            track_alias,
            expires: 0,
            group_order: GroupOrder::Ascending,
            content_exists: largest.is_some(),
            largest_location: largest,
            params: Default::default(),
        });

        shared.set_status(PublishStatus::Ok);
        Ok(())
    }

    fn recv_subscribe_ok(&self, msg: message::SubscribeOk) -> Result<(), SessionError> {
        let handler = {
            let mut state = self.state.lock().unwrap();

            // The publisher assigns the alias; one already routing to a
            // different subscription is provable misbehavior.
            if let Some(bound) = state.tracks_by_alias.get(&msg.track_alias) {
                if *bound != msg.request_id {
                    log::error!(
                        "SUBSCRIBE_OK proposes alias {} already bound to request {}",
                        msg.track_alias,
                        bound
                    );
                    return Err(SessionError::DuplicateTrackAlias);
                }
            }

            let Some(entry) = state.subscriptions.get_mut(&msg.request_id) else {
                // Benign race with a local unsubscribe.
                log::warn!(
                    "SUBSCRIBE_OK for unknown request id {}, dropping",
                    msg.request_id
                );
                return Ok(());
            };
            entry.status = SubscribeStatus::Ok;
            entry.track_alias = Some(msg.track_alias);
            let handler = entry.handler.clone();
            state.tracks_by_alias.insert(msg.track_alias, msg.request_id);
            handler
        };

        handler.status_changed(SubscribeStatus::Ok);
        Ok(())
    }

    fn recv_subscribe_error(&self, msg: message::SubscribeError) -> Result<(), SessionError> {
        log::info!(
            "subscribe {} failed: code={} reason={}",
            msg.request_id,
            msg.error_code,
            msg.error_reason.0
        );

        let status = match msg.error_code {
            error_code::subscribe_error::UNAUTHORIZED => SubscribeStatus::NotAuthorized,
            _ => SubscribeStatus::Error,
        };
        self.remove_subscription(msg.request_id, status);
        Ok(())
    }

    fn recv_subscribe_update(&self, msg: message::SubscribeUpdate) -> Result<(), SessionError> {
        let publication = {
            let state = self.state.lock().unwrap();
            state
                .recv_sub_id
                .get(&msg.subscription_request_id)
                .and_then(|(ns, name)| state.publication(*ns, *name))
        };

        match publication {
            Some(shared) => {
                shared.state.lock().unwrap().priority_override = Some(msg.subscriber_priority);
            }
            None => log::warn!(
                "SUBSCRIBE_UPDATE for unknown subscription {}, dropping",
                msg.subscription_request_id
            ),
        }
        Ok(())
    }

    fn recv_unsubscribe(&self, msg: message::Unsubscribe) -> Result<(), SessionError> {
        let publication = {
            let mut state = self.state.lock().unwrap();
            state
                .recv_sub_id
                .remove(&msg.request_id)
                .and_then(|(ns, name)| state.publication(ns, name))
        };

        match publication {
            Some(shared) => {
                shared.state.lock().unwrap().request_id = None;
                shared.set_status(PublishStatus::NoSubscribers);
            }
            None => log::warn!(
                "UNSUBSCRIBE for unknown request id {}, dropping",
                msg.request_id
            ),
        }
        Ok(())
    }

    fn recv_publish_done(&self, msg: message::PublishDone) -> Result<(), SessionError> {
        log::info!(
            "subscription {} done: code={} reason={}",
            msg.request_id,
            msg.status_code,
            msg.error_reason.0
        );
        self.remove_subscription(msg.request_id, SubscribeStatus::NotSubscribed);
        Ok(())
    }

    fn recv_publish_namespace(&self, msg: message::PublishNamespace) -> Result<(), SessionError> {
        if self.handler.publish_namespace_received(&msg.track_namespace) {
            self.send_message(message::PublishNamespaceOk {
                track_namespace: msg.track_namespace,
            });
        } else {
            self.send_message(message::PublishNamespaceError {
                track_namespace: msg.track_namespace,
                error_code: error_code::publish_namespace_error::UNINTERESTED,
                error_reason: "not accepted".into(),
            });
        }
        Ok(())
    }

    fn recv_publish_namespace_ok(
        &self,
        msg: message::PublishNamespaceOk,
    ) -> Result<(), SessionError> {
        let ns_hash = namespace_hash(&msg.track_namespace);

        // Every track queued under the namespace becomes ready to serve.
        let pending: Vec<_> = {
            let state = self.state.lock().unwrap();
            state
                .publications
                .get(&ns_hash)
                .map(|tracks| {
                    tracks
                        .values()
                        .filter(|shared| {
                            shared.status() == PublishStatus::PendingAnnounceResponse
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if pending.is_empty() {
            log::warn!(
                "PUBLISH_NAMESPACE_OK for unknown namespace {}, dropping",
                msg.track_namespace.to_utf8_path()
            );
        }
        for shared in pending {
            shared.set_status(PublishStatus::NoSubscribers);
        }
        Ok(())
    }

    fn recv_publish_namespace_error(
        &self,
        msg: message::PublishNamespaceError,
    ) -> Result<(), SessionError> {
        log::warn!(
            "namespace {} rejected: code={} reason={}",
            msg.track_namespace.to_utf8_path(),
            msg.error_code,
            msg.error_reason.0
        );

        let ns_hash = namespace_hash(&msg.track_namespace);
        let affected: Vec<_> = {
            let state = self.state.lock().unwrap();
            state
                .publications
                .get(&ns_hash)
                .map(|tracks| tracks.values().cloned().collect())
                .unwrap_or_default()
        };

        for shared in affected {
            shared.set_status(PublishStatus::AnnounceNotAuthorized);
        }
        Ok(())
    }

    fn recv_publish_namespace_cancel(
        &self,
        msg: message::PublishNamespaceCancel,
    ) -> Result<(), SessionError> {
        log::warn!(
            "namespace {} canceled by peer: code={} reason={}",
            msg.track_namespace.to_utf8_path(),
            msg.error_code,
            msg.error_reason.0
        );

        let ns_hash = namespace_hash(&msg.track_namespace);
        let affected: Vec<_> = {
            let state = self.state.lock().unwrap();
            state
                .publications
                .get(&ns_hash)
                .map(|tracks| tracks.values().cloned().collect())
                .unwrap_or_default()
        };

        for shared in affected {
            shared.set_status(PublishStatus::NotAnnounced);
        }
        Ok(())
    }

    fn recv_track_status(&self, msg: message::TrackStatus) -> Result<(), SessionError> {
        let ftn = FullTrackName::new(msg.track_namespace, msg.track_name);
        let hash = TrackHash::new(&ftn);

        let publication = {
            let state = self.state.lock().unwrap();
            state.publication(hash.namespace_hash, hash.name_hash)
        };

        match publication {
            Some(shared) => {
                let pub_state = shared.state.lock().unwrap();
                self.send_message(message::TrackStatusOk {
                    request_id: msg.request_id,
                    track_alias: pub_state.track_alias,
                    expires: 0,
                    group_order: GroupOrder::Ascending,
                    content_exists: pub_state.largest.is_some(),
                    largest_location: pub_state.largest,
                    params: Default::default(),
                });
            }
            None => {
                self.send_message(message::TrackStatusError {
                    request_id: msg.request_id,
                    error_code: error_code::subscribe_error::TRACK_DOES_NOT_EXIST,
                    error_reason: "track does not exist".into(),
                });
            }
        }
        Ok(())
    }

    fn recv_subscribe_namespace(
        &self,
        msg: message::SubscribeNamespace,
    ) -> Result<(), SessionError> {
        if self
            .handler
            .subscribe_namespace_received(&msg.track_namespace_prefix)
        {
            self.send_message(message::SubscribeNamespaceOk {
                request_id: msg.request_id,
            });
        } else {
            self.send_message(message::SubscribeNamespaceError {
                request_id: msg.request_id,
                error_code: 0x4, // namespace prefix unknown
                error_reason: "prefix not served".into(),
            });
        }
        Ok(())
    }

    fn recv_fetch_ok(&self, msg: message::FetchOk) -> Result<(), SessionError> {
        let handler = {
            let mut state = self.state.lock().unwrap();
            match state.subscriptions.get_mut(&msg.request_id) {
                Some(entry) if entry.is_fetch => {
                    entry.status = SubscribeStatus::Ok;
                    entry.handler.clone()
                }
                Some(_) => {
                    log::warn!(
                        "FETCH_OK for non-fetch request {}, dropping",
                        msg.request_id
                    );
                    return Ok(());
                }
                None => {
                    log::warn!("FETCH_OK for unknown request {}, dropping", msg.request_id);
                    return Ok(());
                }
            }
        };

        log::debug!(
            "fetch {} accepted, end={:?} end_of_track={}",
            msg.request_id,
            msg.end_location,
            msg.end_of_track
        );
        handler.status_changed(SubscribeStatus::Ok);
        Ok(())
    }

    fn recv_fetch_error(&self, msg: message::FetchError) -> Result<(), SessionError> {
        log::info!(
            "fetch {} failed: code={} reason={}",
            msg.request_id,
            msg.error_code,
            msg.error_reason.0
        );
        self.remove_subscription(msg.request_id, SubscribeStatus::Error);
        Ok(())
    }

    fn recv_new_group_request(&self, msg: message::NewGroupRequest) -> Result<(), SessionError> {
        let publication = {
            let state = self.state.lock().unwrap();
            state
                .pub_by_alias
                .get(&msg.track_alias)
                .and_then(|(ns, name)| state.publication(*ns, *name))
        };

        match publication {
            Some(shared) => {
                log::debug!(
                    "new group requested for alias {} (request {})",
                    msg.track_alias,
                    msg.request_id
                );
                shared.state.lock().unwrap().new_group_pending = true;
            }
            None => log::warn!(
                "NEW_GROUP_REQUEST for unknown alias {}, dropping",
                msg.track_alias
            ),
        }
        Ok(())
    }
}

/// Write one encodable message directly to a stream (setup only; everything
/// later goes through the outgoing queue).
async fn write_message<T: Encode>(
    stream: &mut web_transport::SendStream,
    msg: &T,
) -> Result<(), SessionError> {
    let mut buf = BytesMut::new();
    msg.encode(&mut buf)?;

    let mut buf = buf.freeze();
    while buf.has_remaining() {
        stream.write_buf(&mut buf).await?;
    }
    Ok(())
}

/// Read one decodable message from a stream, retrying as bytes arrive.
async fn read_message<T: crate::coding::Decode>(
    stream: &mut web_transport::RecvStream,
    buffer: &mut StreamBuffer,
) -> Result<T, SessionError> {
    let mut chunk = BytesMut::new();
    loop {
        if let Some(msg) = buffer.try_decode::<T>()? {
            return Ok(msg);
        }

        if !stream.read_buf(&mut chunk).await? {
            return Err(SessionError::NotConnected);
        }
        buffer.push(&chunk);
        chunk.clear();
    }
}
