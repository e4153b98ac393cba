use crate::coding::{Decode, DecodeError, Encode, EncodeError, Parameters, TrackNamespace};

/// Sent by the subscriber to receive announcements for every namespace
/// under a prefix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeNamespace {
    pub request_id: u64,

    pub track_namespace_prefix: TrackNamespace,

    pub params: Parameters,
}

impl Decode for SubscribeNamespace {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let track_namespace_prefix = TrackNamespace::decode(r)?;
        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            track_namespace_prefix,
            params,
        })
    }
}

impl Encode for SubscribeNamespace {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.track_namespace_prefix.encode(w)?;
        self.params.encode(w)?;

        Ok(())
    }
}
