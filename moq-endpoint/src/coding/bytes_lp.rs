use super::{Decode, DecodeError, Encode, EncodeError};

impl Encode for Vec<u8> {
    /// Encode a byte slice with a varint length prefix.
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.len().encode(w)?;
        Self::encode_remaining(w, self.len())?;
        w.put_slice(self);
        Ok(())
    }
}

impl Decode for Vec<u8> {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let size = usize::decode(r)?;
        Self::decode_remaining(r, size)?;

        let mut buf = vec![0; size];
        r.copy_to_slice(&mut buf);
        Ok(buf)
    }
}

impl Encode for bytes::Bytes {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.len().encode(w)?;
        Self::encode_remaining(w, self.len())?;
        w.put_slice(self);
        Ok(())
    }
}

impl Decode for bytes::Bytes {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let size = usize::decode(r)?;
        Self::decode_remaining(r, size)?;
        Ok(r.copy_to_bytes(size))
    }
}

impl Encode for String {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.len().encode(w)?;
        Self::encode_remaining(w, self.len())?;
        w.put(self.as_ref());
        Ok(())
    }
}

impl Decode for String {
    /// Decode a string with a varint length prefix.
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let buf = Vec::<u8>::decode(r)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode_bytes() {
        let mut buf = BytesMut::new();

        let b = vec![0x01, 0x02, 0x03];
        b.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x03, 0x01, 0x02, 0x03]);
        let decoded = Vec::<u8>::decode(&mut buf).unwrap();
        assert_eq!(decoded, b);

        // An empty slice is legal and occupies a single length byte.
        let b: Vec<u8> = Vec::new();
        b.encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x00]);
        let decoded = Vec::<u8>::decode(&mut buf).unwrap();
        assert_eq!(decoded, b);
    }

    #[test]
    fn encode_decode_string() {
        let mut buf = BytesMut::new();

        let s = "teststring".to_string();
        s.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf.to_vec(), vec![
            0x0a, // Length of "teststring" is 10
            0x74, 0x65, 0x73, 0x74, 0x73, 0x74, 0x72, 0x69, 0x6e, 0x67 ]);
        let decoded = String::decode(&mut buf).unwrap();
        assert_eq!(decoded, s);
    }

    #[test]
    fn decode_truncated() {
        let data: Vec<u8> = vec![0x05, 0x01, 0x02];
        let mut buf: bytes::Bytes = data.into();
        let decoded = Vec::<u8>::decode(&mut buf);
        assert!(matches!(decoded.unwrap_err(), DecodeError::More(3)));
    }
}
