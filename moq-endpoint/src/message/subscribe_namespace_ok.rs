use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Accepts a SubscribeNamespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeNamespaceOk {
    pub request_id: u64,
}

impl Decode for SubscribeNamespaceOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        Ok(Self { request_id })
    }
}

impl Encode for SubscribeNamespaceOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let msg = SubscribeNamespaceOk { request_id: 4 };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeNamespaceOk::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
