use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher to reject a Subscribe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeError {
    /// The request ID of the SUBSCRIBE this message is replying to.
    pub request_id: u64,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for SubscribeError {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let error_code = u64::decode(r)?;
        let error_reason = ReasonPhrase::decode(r)?;

        Ok(Self {
            request_id,
            error_code,
            error_reason,
        })
    }
}

impl Encode for SubscribeError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.error_code.encode(w)?;
        self.error_reason.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::error_code::subscribe_error;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = SubscribeError {
            request_id: 12345,
            error_code: subscribe_error::TRACK_DOES_NOT_EXIST,
            error_reason: "unknown track".into(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeError::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
