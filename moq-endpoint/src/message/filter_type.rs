use crate::coding::{Decode, DecodeError, Encode, EncodeError};

/// The range of objects a subscription asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterType {
    LatestGroup = 0x1,
    LatestObject = 0x2,
    AbsoluteStart = 0x3,
    AbsoluteRange = 0x4,
}

impl FilterType {
    /// True when the message carries an explicit start location.
    pub fn has_start(&self) -> bool {
        matches!(self, Self::AbsoluteStart | Self::AbsoluteRange)
    }

    /// True when the message carries an explicit end group.
    pub fn has_end(&self) -> bool {
        matches!(self, Self::AbsoluteRange)
    }
}

impl Encode for FilterType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        (*self as u64).encode(w)?;
        Ok(())
    }
}

impl Decode for FilterType {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x1 => Ok(Self::LatestGroup),
            0x2 => Ok(Self::LatestObject),
            0x3 => Ok(Self::AbsoluteStart),
            0x4 => Ok(Self::AbsoluteRange),
            _ => Err(DecodeError::InvalidFilterType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        let cases = [
            (FilterType::LatestGroup, 0x01u8, false, false),
            (FilterType::LatestObject, 0x02, false, false),
            (FilterType::AbsoluteStart, 0x03, true, false),
            (FilterType::AbsoluteRange, 0x04, true, true),
        ];

        for (ft, byte, start, end) in cases {
            let mut buf = BytesMut::new();
            ft.encode(&mut buf).unwrap();
            assert_eq!(buf.to_vec(), vec![byte]);
            assert_eq!(FilterType::decode(&mut buf).unwrap(), ft);
            assert_eq!(ft.has_start(), start);
            assert_eq!(ft.has_end(), end);
        }
    }

    #[test]
    fn decode_bad_value() {
        let data: Vec<u8> = vec![0x05];
        let mut buf: Bytes = data.into();
        let result = FilterType::decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::InvalidFilterType)));
    }
}
