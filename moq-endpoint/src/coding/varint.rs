use super::{Decode, DecodeError, Encode, EncodeError};

use std::fmt;

/// A value exceeded the 62-bit range of a variable-length integer.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("value out of varint range")]
pub struct BoundsExceeded;

/// A QUIC variable-length integer per RFC 9000 section 16.
///
/// The two most significant bits of the first byte carry the encoded length
/// (00 = 1, 01 = 2, 10 = 4, 11 = 8 bytes), leaving 6/14/30/62 bits of value.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarInt(u64);

impl VarInt {
    pub const MAX: Self = Self((1 << 62) - 1);

    /// Construct from a u32, which always fits.
    pub const fn from_u32(v: u32) -> Self {
        Self(v as u64)
    }

    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// The number of bytes the encoding occupies, derived from the first byte.
    pub fn size(first_byte: u8) -> usize {
        match first_byte >> 6 {
            0b00 => 1,
            0b01 => 2,
            0b10 => 4,
            _ => 8,
        }
    }
}

impl TryFrom<u64> for VarInt {
    type Error = BoundsExceeded;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        if v <= Self::MAX.0 {
            Ok(Self(v))
        } else {
            Err(BoundsExceeded)
        }
    }
}

impl TryFrom<usize> for VarInt {
    type Error = BoundsExceeded;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        Self::try_from(v as u64)
    }
}

impl From<VarInt> for u64 {
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl TryFrom<VarInt> for u32 {
    type Error = std::num::TryFromIntError;

    fn try_from(v: VarInt) -> Result<Self, Self::Error> {
        u32::try_from(v.0)
    }
}

impl TryFrom<VarInt> for usize {
    type Error = std::num::TryFromIntError;

    fn try_from(v: VarInt) -> Result<Self, Self::Error> {
        usize::try_from(v.0)
    }
}

impl Encode for VarInt {
    /// Encode with the smallest length that fits the value.
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        let x = self.0;
        if x < (1 << 6) {
            Self::encode_remaining(w, 1)?;
            w.put_u8(x as u8);
        } else if x < (1 << 14) {
            Self::encode_remaining(w, 2)?;
            w.put_u16(0b01 << 14 | x as u16);
        } else if x < (1 << 30) {
            Self::encode_remaining(w, 4)?;
            w.put_u32(0b10 << 30 | x as u32);
        } else if x < (1 << 62) {
            Self::encode_remaining(w, 8)?;
            w.put_u64(0b11 << 62 | x);
        } else {
            return Err(EncodeError::BoundsExceeded(BoundsExceeded));
        }
        Ok(())
    }
}

impl Decode for VarInt {
    /// Decode a varint of any length, including non-minimal encodings.
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        Self::decode_remaining(r, 1)?;

        let mut buf = [0u8; 8];
        buf[0] = r.get_u8();

        let size = Self::size(buf[0]);
        buf[0] &= 0b0011_1111;

        Self::decode_remaining(r, size - 1)?;
        r.copy_to_slice(&mut buf[1..size]);

        let mut value: u64 = 0;
        for b in &buf[..size] {
            value = value << 8 | *b as u64;
        }

        Ok(Self(value))
    }
}

impl fmt::Debug for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Buf, Bytes, BytesMut};

    #[test]
    fn encode_minimal() {
        // Each boundary value must use the smallest encoding that fits.
        let cases: &[(u64, usize)] = &[
            (0, 1),
            (63, 1),
            (64, 2),
            (16383, 2),
            (16384, 4),
            (1073741823, 4),
            (1073741824, 8),
            ((1 << 62) - 1, 8),
        ];

        for (value, size) in cases {
            let mut buf = BytesMut::new();
            VarInt::try_from(*value).unwrap().encode(&mut buf).unwrap();
            assert_eq!(buf.len(), *size, "value {}", value);

            let decoded = VarInt::decode(&mut buf).unwrap();
            assert_eq!(decoded.into_inner(), *value);
        }
    }

    #[test]
    fn encode_too_large() {
        assert_eq!(VarInt::try_from(1u64 << 62).unwrap_err(), BoundsExceeded);
    }

    #[test]
    fn decode_non_minimal() {
        // 1 encoded with 2, 4 and 8 bytes; decoders must not reject padding.
        let encodings: &[&[u8]] = &[
            &[0x01],
            &[0x40, 0x01],
            &[0x80, 0x00, 0x00, 0x01],
            &[0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01],
        ];

        for bytes in encodings {
            let mut buf = Bytes::copy_from_slice(bytes);
            let decoded = VarInt::decode(&mut buf).unwrap();
            assert_eq!(decoded.into_inner(), 1);
            assert!(!buf.has_remaining());
        }
    }

    #[test]
    fn decode_truncated() {
        let mut buf = Bytes::copy_from_slice(&[0xC0, 0x00, 0x00]);
        let decoded = VarInt::decode(&mut buf);
        assert!(matches!(decoded.unwrap_err(), DecodeError::More(_)));
    }

    #[test]
    fn size_from_first_byte() {
        assert_eq!(VarInt::size(0x00), 1);
        assert_eq!(VarInt::size(0x3f), 1);
        assert_eq!(VarInt::size(0x40), 2);
        assert_eq!(VarInt::size(0x80), 4);
        assert_eq!(VarInt::size(0xC0), 8);
    }
}
