use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase, TrackNamespace};

/// Sent by the subscriber to revoke a previously accepted namespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishNamespaceCancel {
    pub track_namespace: TrackNamespace,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for PublishNamespaceCancel {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let error_code = u64::decode(r)?;
        let error_reason = ReasonPhrase::decode(r)?;

        Ok(Self {
            track_namespace,
            error_code,
            error_reason,
        })
    }
}

impl Encode for PublishNamespaceCancel {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.error_code.encode(w)?;
        self.error_reason.encode(w)?;

        Ok(())
    }
}
