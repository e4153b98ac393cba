use crate::coding::{Decode, DecodeError, Encode, EncodeError, Parameters, TrackNamespace};

/// Sent by the publisher to declare it will publish tracks under a namespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishNamespace {
    pub track_namespace: TrackNamespace,

    pub params: Parameters,
}

impl Decode for PublishNamespace {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let params = Parameters::decode(r)?;

        Ok(Self {
            track_namespace,
            params,
        })
    }
}

impl Encode for PublishNamespace {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.params.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut params = Parameters::new();
        params.set_bytes(123, vec![0x00, 0x01, 0x02, 0x03]);

        let msg = PublishNamespace {
            track_namespace: TrackNamespace::from_utf8_path("conf.example.com/conf/1"),
            params,
        };
        msg.encode(&mut buf).unwrap();
        let decoded = PublishNamespace::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
