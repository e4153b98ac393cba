use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the subscriber to reject a Publish.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishError {
    pub request_id: u64,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for PublishError {
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

impl Encode for PublishError {
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
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = PublishError {
            request_id: 7,
            error_code: 1,
            error_reason: "uninterested".into(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = PublishError::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
