use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher to cleanly terminate a subscription.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishDone {
    /// The request ID of the subscription being terminated.
    pub request_id: u64,

    /// Why the subscription ended.
    pub status_code: u64,

    /// The number of data streams the publisher opened for this subscription.
    pub stream_count: u64,

    pub error_reason: ReasonPhrase,
}

impl Decode for PublishDone {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let status_code = u64::decode(r)?;
        let stream_count = u64::decode(r)?;
        let error_reason = ReasonPhrase::decode(r)?;

        Ok(Self {
            request_id,
            status_code,
            stream_count,
            error_reason,
        })
    }
}

impl Encode for PublishDone {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.status_code.encode(w)?;
        self.stream_count.encode(w)?;
        self.error_reason.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::error_code::publish_done;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = PublishDone {
            request_id: 2,
            status_code: publish_done::TRACK_ENDED,
            stream_count: 7,
            error_reason: "end of track".into(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = PublishDone::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
