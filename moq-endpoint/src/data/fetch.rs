use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use crate::data::{Extensions, ObjectStatus, StreamHeaderType};

/// The header opening a fetch response stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchHeader {
    /// The request ID of the FETCH being answered.
    pub request_id: u64,
}

impl Decode for FetchHeader {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let header_type = StreamHeaderType::decode(r)?;
        if !header_type.is_fetch() {
            return Err(DecodeError::InvalidHeaderType);
        }

        let request_id = u64::decode(r)?;
        Ok(Self { request_id })
    }
}

impl Encode for FetchHeader {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        StreamHeaderType::Fetch.encode(w)?;
        self.request_id.encode(w)?;
        Ok(())
    }
}

/// One object record within a fetch stream. Unlike subgroup records, every
/// record restates its full location and always carries extensions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchObject {
    pub group_id: u64,
    pub subgroup_id: u64,
    pub object_id: u64,

    /// Publisher priority, where smaller values are sent first.
    pub priority: u8,

    pub extensions: Extensions,

    /// An empty payload carries an explicit status instead.
    pub status: Option<ObjectStatus>,
    pub payload: bytes::Bytes,
}

impl Decode for FetchObject {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let group_id = u64::decode(r)?;
        let subgroup_id = u64::decode(r)?;
        let object_id = u64::decode(r)?;
        let priority = u8::decode(r)?;
        let extensions = Extensions::decode(r)?;
        let payload = bytes::Bytes::decode(r)?;
        let status = match payload.is_empty() {
            true => Some(ObjectStatus::decode(r)?),
            false => None,
        };

        Ok(Self {
            group_id,
            subgroup_id,
            object_id,
            priority,
            extensions,
            status,
            payload,
        })
    }
}

impl Encode for FetchObject {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.group_id.encode(w)?;
        self.subgroup_id.encode(w)?;
        self.object_id.encode(w)?;
        self.priority.encode(w)?;
        self.extensions.encode(w)?;
        self.payload.encode(w)?;
        if self.payload.is_empty() {
            match self.status {
                Some(status) => status.encode(w)?,
                None => return Err(EncodeError::MissingField("Status".to_string())),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::StreamBuffer;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode_header() {
        let mut buf = BytesMut::new();

        let hdr = FetchHeader { request_id: 10 };
        hdr.encode(&mut buf).unwrap();
        assert_eq!(buf[0], 0x05); // FETCH_HEADER stream type
        let decoded = FetchHeader::decode(&mut buf).unwrap();
        assert_eq!(decoded, hdr);
    }

    #[test]
    fn header_then_objects() {
        let mut buf = BytesMut::new();

        FetchHeader { request_id: 10 }.encode(&mut buf).unwrap();

        let mut objects = Vec::new();
        for i in 0..5 {
            let obj = FetchObject {
                group_id: 0x1000 + i,
                subgroup_id: 0,
                object_id: i,
                priority: 0xA,
                extensions: Extensions::new(),
                status: None,
                payload: Bytes::from_static(&[0x1, 0x2, 0x3]),
            };
            obj.encode(&mut buf).unwrap();
            objects.push(obj);
        }

        let mut sbuf = StreamBuffer::new();
        sbuf.push(&buf);

        let hdr = sbuf.try_decode::<FetchHeader>().unwrap().unwrap();
        assert_eq!(hdr.request_id, 10);

        for expected in &objects {
            let decoded = sbuf.try_decode::<FetchObject>().unwrap().unwrap();
            assert_eq!(&decoded, expected);
        }
        assert!(sbuf.is_empty());
    }

    #[test]
    fn empty_payload_carries_status() {
        let mut buf = BytesMut::new();

        let obj = FetchObject {
            group_id: 1,
            subgroup_id: 2,
            object_id: 3,
            priority: 127,
            extensions: Extensions::new(),
            status: Some(ObjectStatus::EndOfGroup),
            payload: Bytes::new(),
        };
        obj.encode(&mut buf).unwrap();
        let decoded = FetchObject::decode(&mut buf).unwrap();
        assert_eq!(decoded, obj);
    }
}
