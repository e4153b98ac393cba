use crate::coding::{Decode, DecodeError, Encode, EncodeError, KeyValuePair};

use std::fmt;

/// Extension headers attached to an object: a varint count followed by that
/// many key-value pairs.
///
/// Unknown extensions may repeat, so unlike parameter lists there is no
/// duplicate check.
#[derive(Default, Clone, Eq, PartialEq)]
pub struct Extensions(pub Vec<KeyValuePair>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, key: u64, value: u64) {
        self.set(KeyValuePair::new_int(key, value));
    }

    pub fn set_bytes(&mut self, key: u64, value: Vec<u8>) {
        self.set(KeyValuePair::new_bytes(key, value));
    }

    /// Insert or replace the pair with the same key.
    pub fn set(&mut self, kvp: KeyValuePair) {
        if let Some(existing) = self.0.iter_mut().find(|k| k.key == kvp.key) {
            *existing = kvp;
        } else {
            self.0.push(kvp);
        }
    }

    pub fn has(&self, key: u64) -> bool {
        self.0.iter().any(|k| k.key == key)
    }

    pub fn get(&self, key: u64) -> Option<&KeyValuePair> {
        self.0.iter().find(|k| k.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decode for Extensions {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let count = usize::decode(r)?;

        let mut kvps = Vec::new();
        for _ in 0..count {
            kvps.push(KeyValuePair::decode(r)?);
        }

        Ok(Extensions(kvps))
    }
}

impl Encode for Extensions {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.0.len().encode(w)?;
        for kvp in &self.0 {
            kvp.encode(w)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (i, kv) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", kv)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut ext = Extensions::new();
        ext.set_bytes(1, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
        ext.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(
            buf.to_vec(),
            vec![
                0x01, // 1 extension
                0x01, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05, // Key=1, Value=[1,2,3,4,5]
            ]
        );
        let decoded = Extensions::decode(&mut buf).unwrap();
        assert_eq!(decoded, ext);
    }

    #[test]
    fn even_key_round_trip() {
        let mut buf = BytesMut::new();

        // An even key rides as a varint; the little-endian byte rendering
        // must survive the round trip.
        let mut ext = Extensions::new();
        ext.set_int(2, u64::from_le_bytes([0, 0, 0, 0, 0, 0x03, 0x02, 0x01]));
        ext.encode(&mut buf).unwrap();
        let decoded = Extensions::decode(&mut buf).unwrap();
        assert_eq!(decoded, ext);
        assert_eq!(
            decoded.get(2).unwrap().value.as_int().unwrap().to_le_bytes(),
            [0, 0, 0, 0, 0, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn empty() {
        let mut buf = BytesMut::new();

        Extensions::new().encode(&mut buf).unwrap();
        assert_eq!(buf.to_vec(), vec![0x00]);
        let decoded = Extensions::decode(&mut buf).unwrap();
        assert!(decoded.is_empty());
    }
}
