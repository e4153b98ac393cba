use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Sent by the publisher when a TrackStatus query cannot be answered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrackStatusError {
    pub request_id: u64,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for TrackStatusError {
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

impl Encode for TrackStatusError {
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

        let msg = TrackStatusError {
            request_id: 9,
            error_code: 4,
            error_reason: "unknown track".into(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = TrackStatusError::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
