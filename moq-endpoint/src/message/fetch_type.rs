use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// Standalone fetch of a named range, or a fetch joined to an existing
/// subscription.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchType {
    Standalone = 0x1,
    Joining = 0x2,
}

impl Encode for FetchType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        (*self as u8).encode(w)?;
        Ok(())
    }
}

impl Decode for FetchType {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match u8::decode(r)? {
            0x1 => Ok(Self::Standalone),
            0x2 => Ok(Self::Joining),
            _ => Err(DecodeError::InvalidFetchType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let ft = FetchType::Standalone;
        ft.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x01]);
        assert_eq!(FetchType::decode(&mut buf).unwrap(), ft);

        let ft = FetchType::Joining;
        ft.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x02]);
        assert_eq!(FetchType::decode(&mut buf).unwrap(), ft);
    }

    #[test]
    fn decode_bad_value() {
        let data: Vec<u8> = vec![0x03];
        let mut buf: Bytes = data.into();
        let result = FetchType::decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::InvalidFetchType)));
    }
}
