use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Sent when a request could not be allocated under the peer's limit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestsBlocked {
    /// The limit the sender is blocked on.
    pub maximum_request_id: u64,
}

impl Decode for RequestsBlocked {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let maximum_request_id = u64::decode(r)?;
        Ok(Self { maximum_request_id })
    }
}

impl Encode for RequestsBlocked {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.maximum_request_id.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = RequestsBlocked {
            maximum_request_id: 12345,
        };
        msg.encode(&mut buf).unwrap();
        let decoded = RequestsBlocked::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
