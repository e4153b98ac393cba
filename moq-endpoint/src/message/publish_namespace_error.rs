use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase, TrackNamespace};

/// Sent by the subscriber to reject a PublishNamespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishNamespaceError {
    pub track_namespace: TrackNamespace,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for PublishNamespaceError {
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

impl Encode for PublishNamespaceError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.error_code.encode(w)?;
        self.error_reason.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::error_code::publish_namespace_error;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = PublishNamespaceError {
            track_namespace: TrackNamespace::from_utf8_path("conf.example.com/conf/1"),
            error_code: publish_namespace_error::UNAUTHORIZED,
            error_reason: "not authorized".into(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = PublishNamespaceError::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
