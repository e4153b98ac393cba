use super::{Decode, DecodeError, Encode, EncodeError};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// An ordered tuple of byte-slice elements naming a track namespace.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TrackNamespace {
    pub elements: Vec<Vec<u8>>,
}

impl TrackNamespace {
    pub const MAX_ELEMENTS: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: Vec<u8>) {
        self.elements.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Split a "/" separated path into tuple elements.
    pub fn from_utf8_path(path: &str) -> Self {
        Self {
            elements: path.split('/').map(|p| p.as_bytes().to_vec()).collect(),
        }
    }

    pub fn to_utf8_path(&self) -> String {
        let mut path = String::new();
        for element in &self.elements {
            path.push('/');
            path.push_str(&String::from_utf8_lossy(element));
        }
        path
    }
}

impl Decode for TrackNamespace {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let count = usize::decode(r)?;
        if count > Self::MAX_ELEMENTS {
            return Err(DecodeError::FieldBoundsExceeded(
                "TrackNamespace tuples".to_string(),
            ));
        }

        let mut elements = Vec::new();
        for _ in 0..count {
            elements.push(Vec::<u8>::decode(r)?);
        }
        Ok(Self { elements })
    }
}

impl Encode for TrackNamespace {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        if self.elements.len() > Self::MAX_ELEMENTS {
            return Err(EncodeError::FieldBoundsExceeded(
                "TrackNamespace tuples".to_string(),
            ));
        }
        self.elements.len().encode(w)?;
        for element in &self.elements {
            element.encode(w)?;
        }
        Ok(())
    }
}

/// The logical identity of a track: a namespace tuple plus a name.
///
/// The optional alias is the per-session shorthand the publisher assigns; it
/// is a hint, not part of the identity.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FullTrackName {
    pub namespace: TrackNamespace,
    pub name: Vec<u8>,
    pub alias: Option<u64>,
}

impl FullTrackName {
    pub fn new(namespace: TrackNamespace, name: Vec<u8>) -> Self {
        Self {
            namespace,
            name,
            alias: None,
        }
    }

    pub fn from_utf8_path(namespace: &str, name: &str) -> Self {
        Self::new(
            TrackNamespace::from_utf8_path(namespace),
            name.as_bytes().to_vec(),
        )
    }
}

/// Hashes of a full track name, used as registry keys.
///
/// The hashes are deterministic for this implementation but never
/// transmitted; only the alias derived from the fullname hash goes on the
/// wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrackHash {
    pub namespace_hash: u64,
    pub name_hash: u64,
    pub track_fullname_hash: u64,
}

impl TrackHash {
    pub fn new(ftn: &FullTrackName) -> Self {
        Self {
            namespace_hash: namespace_hash(&ftn.namespace),
            name_hash: hash_of(&ftn.name),
            track_fullname_hash: hash_of(&(&ftn.namespace.elements, &ftn.name)),
        }
    }

    /// The track alias for this name: the fullname hash clamped to the
    /// 62-bit varint range.
    pub fn track_alias(&self) -> u64 {
        self.track_fullname_hash & ((1 << 62) - 1)
    }
}

/// The registry key for a namespace alone.
pub fn namespace_hash(namespace: &TrackNamespace) -> u64 {
    hash_of(&namespace.elements)
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    // DefaultHasher with no keys is stable across runs of the same build.
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let t = TrackNamespace::from_utf8_path("test/path/to/resource");
        t.encode(&mut buf).unwrap();
        #[rustfmt::skip]
        assert_eq!(buf.to_vec(), vec![
            0x04,  // 4 tuple elements
            0x04, 0x74, 0x65, 0x73, 0x74, // "test"
            0x04, 0x70, 0x61, 0x74, 0x68, // "path"
            0x02, 0x74, 0x6f, // "to"
            0x08, 0x72, 0x65, 0x73, 0x6f, 0x75, 0x72, 0x63, 0x65]); // "resource"
        let decoded = TrackNamespace::decode(&mut buf).unwrap();
        assert_eq!(decoded, t);
    }

    #[test]
    fn decode_too_large() {
        let mut data: Vec<u8> = vec![0x00; 256];
        data[0] = (TrackNamespace::MAX_ELEMENTS + 1) as u8;
        let mut buf: Bytes = data.into();
        let decoded = TrackNamespace::decode(&mut buf);
        assert!(matches!(
            decoded.unwrap_err(),
            DecodeError::FieldBoundsExceeded(_)
        ));
    }

    #[test]
    fn track_hash_deterministic() {
        let a = FullTrackName::from_utf8_path("conf.example.com/conf/1", "alice/video");
        let b = FullTrackName::from_utf8_path("conf.example.com/conf/1", "alice/video");
        assert_eq!(TrackHash::new(&a), TrackHash::new(&b));

        let c = FullTrackName::from_utf8_path("conf.example.com/conf/1", "bob/video");
        assert_ne!(
            TrackHash::new(&a).track_fullname_hash,
            TrackHash::new(&c).track_fullname_hash
        );
        assert_eq!(
            TrackHash::new(&a).namespace_hash,
            TrackHash::new(&c).namespace_hash
        );
    }

    #[test]
    fn track_alias_in_varint_range() {
        let ftn = FullTrackName::from_utf8_path("conf.example.com/conf/1", "alice/video");
        let th = TrackHash::new(&ftn);
        assert!(th.track_alias() < (1 << 62));
    }
}
