use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher to reject a Fetch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchError {
    pub request_id: u64,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for FetchError {
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

impl Encode for FetchError {
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
    use crate::message::error_code::fetch_error;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = FetchError {
            request_id: 12345,
            error_code: fetch_error::INVALID_RANGE,
            error_reason: "bad range".into(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = FetchError::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
