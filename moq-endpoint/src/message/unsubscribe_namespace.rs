use crate::coding::{Decode, DecodeError, Encode, EncodeError, TrackNamespace};

/// Stops a namespace-prefix subscription.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsubscribeNamespace {
    pub track_namespace_prefix: TrackNamespace,
}

impl Decode for UnsubscribeNamespace {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace_prefix = TrackNamespace::decode(r)?;
        Ok(Self {
            track_namespace_prefix,
        })
    }
}

impl Encode for UnsubscribeNamespace {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace_prefix.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = UnsubscribeNamespace {
            track_namespace_prefix: TrackNamespace::from_utf8_path("conf.example.com"),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = UnsubscribeNamespace::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
