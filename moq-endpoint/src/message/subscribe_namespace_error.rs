use crate::coding::{Decode, DecodeError, Encode, EncodeError, ReasonPhrase};

/// Rejects a SubscribeNamespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeNamespaceError {
    pub request_id: u64,

    pub error_code: u64,
    pub error_reason: ReasonPhrase,
}

impl Decode for SubscribeNamespaceError {
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

impl Encode for SubscribeNamespaceError {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.error_code.encode(w)?;
        self.error_reason.encode(w)?;

        Ok(())
    }
}
