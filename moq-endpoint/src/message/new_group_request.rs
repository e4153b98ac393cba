use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent by the subscriber to ask the publisher to start a fresh group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewGroupRequest {
    /// The request ID of the subscription asking for a new group.
    pub request_id: u64,

    pub track_alias: u64,
}

impl Decode for NewGroupRequest {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let track_alias = u64::decode(r)?;

        Ok(Self {
            request_id,
            track_alias,
        })
    }
}

impl Encode for NewGroupRequest {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.track_alias.encode(w)?;

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

        let msg = NewGroupRequest {
            request_id: 2,
            track_alias: 0xA11CE,
        };
        msg.encode(&mut buf).unwrap();
        let decoded = NewGroupRequest::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
