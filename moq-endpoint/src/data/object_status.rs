use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The state of an object, sent in place of a payload when the payload
/// length is zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectStatus {
    Available = 0x0,
    DoesNotExist = 0x1,
    GroupDoesNotExist = 0x2,
    EndOfGroup = 0x3,
    EndOfTrack = 0x4,
}

impl Decode for ObjectStatus {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x0 => Ok(Self::Available),
            0x1 => Ok(Self::DoesNotExist),
            0x2 => Ok(Self::GroupDoesNotExist),
            0x3 => Ok(Self::EndOfGroup),
            0x4 => Ok(Self::EndOfTrack),
            _ => Err(DecodeError::InvalidObjectStatus),
        }
    }
}

impl Encode for ObjectStatus {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        (*self as u64).encode(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        for (status, byte) in [
            (ObjectStatus::Available, 0x00u8),
            (ObjectStatus::DoesNotExist, 0x01),
            (ObjectStatus::GroupDoesNotExist, 0x02),
            (ObjectStatus::EndOfGroup, 0x03),
            (ObjectStatus::EndOfTrack, 0x04),
        ] {
            let mut buf = BytesMut::new();
            status.encode(&mut buf).unwrap();
            assert_eq!(buf.to_vec(), vec![byte]);
            assert_eq!(ObjectStatus::decode(&mut buf).unwrap(), status);
        }
    }

    #[test]
    fn decode_bad_value() {
        let mut buf = Bytes::copy_from_slice(&[0x05]);
        let result = ObjectStatus::decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::InvalidObjectStatus)));
    }
}
