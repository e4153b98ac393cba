use crate::coding::{Decode, StreamBuffer};
use crate::data::{
    FetchHeader, FetchObject, ObjectDatagram, ObjectStatus, StreamHeaderType, SubgroupHeader,
    SubgroupIdKind, SubgroupObject,
};
use crate::session::{SessionError, SessionInner};
use crate::track::ObjectHeaders;

use bytes::BytesMut;
use futures::{stream::FuturesUnordered, StreamExt};
use std::sync::Arc;

/// The typed work-in-progress parse state of one inbound data stream: the
/// header already read, then object records until the stream ends.
enum DataStreamState {
    Start,
    Subgroup {
        header: SubgroupHeader,
        /// Resolved lazily for the first-object-id header variants.
        subgroup_id: Option<u64>,
    },
    Fetch {
        request_id: u64,
    },
}

/// Accept unidirectional streams and spawn a reader per stream.
pub(crate) async fn run_streams(inner: Arc<SessionInner>) -> Result<(), SessionError> {
    let mut tasks = FuturesUnordered::new();
    let mut webtransport = inner.webtransport.clone();

    loop {
        tokio::select! {
            res = webtransport.accept_uni() => {
                let stream = res?;
                let inner = inner.clone();

                tasks.push(async move {
                    if let Err(err) = recv_stream(inner, stream).await {
                        log::warn!("failed to serve data stream: {}", err);
                    }
                });
            },
            _ = tasks.next(), if !tasks.is_empty() => {},
        };
    }
}

/// Parse one unidirectional stream: a header, then objects until FIN,
/// tolerating arbitrary read boundaries.
async fn recv_stream(
    inner: Arc<SessionInner>,
    mut stream: web_transport::RecvStream,
) -> Result<(), SessionError> {
    let mut sbuf = StreamBuffer::new();
    let mut state = DataStreamState::Start;
    let mut chunk = BytesMut::new();

    loop {
        loop {
            match &mut state {
                DataStreamState::Start => {
                    let Some(leading) = sbuf.peek_varint() else {
                        break;
                    };

                    let Ok(header_type) = StreamHeaderType::try_from(leading) else {
                        log::warn!("unknown data stream type {:#x}, ignoring stream", leading);
                        return Ok(());
                    };
                    sbuf.set_tag(leading);

                    if header_type.is_fetch() {
                        match sbuf.try_decode::<FetchHeader>()? {
                            Some(header) => {
                                log::trace!("fetch stream for request {}", header.request_id);
                                state = DataStreamState::Fetch {
                                    request_id: header.request_id,
                                };
                            }
                            None => break,
                        }
                    } else {
                        match sbuf.try_decode::<SubgroupHeader>()? {
                            Some(header) => {
                                log::trace!(
                                    "subgroup stream: alias={} group={} subgroup={:?}",
                                    header.track_alias,
                                    header.group_id,
                                    header.subgroup_id
                                );
                                state = DataStreamState::Subgroup {
                                    subgroup_id: header.subgroup_id,
                                    header,
                                };
                            }
                            None => break,
                        }
                    }
                }

                DataStreamState::Subgroup {
                    header,
                    subgroup_id,
                } => {
                    let has_extensions = header.header_type.has_extensions();
                    match sbuf.try_decode_with(|r| SubgroupObject::decode_ext(r, has_extensions))? {
                        Some(object) => {
                            if subgroup_id.is_none()
                                && header.header_type.subgroup_id_kind()
                                    == SubgroupIdKind::FirstObject
                            {
                                *subgroup_id = Some(object.object_id);
                            }

                            let headers = ObjectHeaders {
                                group_id: header.group_id,
                                object_id: object.object_id,
                                subgroup_id: *subgroup_id,
                                priority: header.priority,
                                ttl_ms: None,
                                status: object.status.unwrap_or(ObjectStatus::Available),
                                end_of_group: header.header_type.end_of_group(),
                                extensions: object.extensions,
                            };
                            inner.deliver_object_by_alias(
                                header.track_alias,
                                headers,
                                object.payload,
                            );
                        }
                        None => break,
                    }
                }

                DataStreamState::Fetch { request_id } => {
                    match sbuf.try_decode::<FetchObject>()? {
                        Some(object) => {
                            let headers = ObjectHeaders {
                                group_id: object.group_id,
                                object_id: object.object_id,
                                subgroup_id: Some(object.subgroup_id),
                                priority: object.priority,
                                ttl_ms: None,
                                status: object.status.unwrap_or(ObjectStatus::Available),
                                end_of_group: false,
                                extensions: Some(object.extensions),
                            };
                            inner.deliver_object_by_request(*request_id, headers, object.payload);
                        }
                        None => break,
                    }
                }
            }
        }

        if !stream.read_buf(&mut chunk).await? {
            if !sbuf.is_empty() {
                log::warn!("data stream ended mid-message, {} bytes unparsed", sbuf.len());
            }
            return Ok(());
        }
        inner.state.lock().unwrap().metrics.bytes_received += chunk.len() as u64;
        sbuf.push(&chunk);
        chunk.clear();
    }
}

/// Receive datagrams: one complete OBJECT_DATAGRAM each, decoded
/// single-shot.
pub(crate) async fn run_datagrams(inner: Arc<SessionInner>) -> Result<(), SessionError> {
    let mut webtransport = inner.webtransport.clone();

    loop {
        let mut datagram = webtransport.recv_datagram().await?;
        inner.state.lock().unwrap().metrics.bytes_received += datagram.len() as u64;

        let msg = match ObjectDatagram::decode(&mut datagram) {
            Ok(msg) => msg,
            Err(err) => {
                // A datagram that is not an object datagram is dropped
                // without fuss.
                log::trace!("dropping undecodable datagram: {}", err);
                continue;
            }
        };

        let headers = ObjectHeaders {
            group_id: msg.group_id,
            object_id: msg.object_id,
            subgroup_id: None,
            priority: msg.priority,
            ttl_ms: None,
            status: msg.status.unwrap_or(ObjectStatus::Available),
            end_of_group: msg.datagram_type.end_of_group(),
            extensions: msg.extensions,
        };
        inner.deliver_object_by_alias(msg.track_alias, headers, msg.payload.unwrap_or_default());
    }
}
