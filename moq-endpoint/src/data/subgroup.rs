use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use crate::data::{Extensions, ObjectStatus};

/// How the subgroup id is conveyed in a subgroup stream header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubgroupIdKind {
    /// The header omits the id; the receiver uses 0.
    Zero,
    /// The header omits the id; the receiver adopts the first object id it
    /// sees on this stream.
    FirstObject,
    /// The header carries the id as a varint.
    Explicit,
}

/// The leading varint of a unidirectional data stream.
///
/// Twelve subgroup variants (three subgroup-id encodings x {not-end/end of
/// group} x {no/with extensions}) plus the fetch header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamHeaderType {
    SubgroupZeroId = 0x10,
    SubgroupZeroIdExt = 0x11,
    SubgroupFirstObjectId = 0x12,
    SubgroupFirstObjectIdExt = 0x13,
    SubgroupId = 0x14,
    SubgroupIdExt = 0x15,
    SubgroupZeroIdEndOfGroup = 0x18,
    SubgroupZeroIdExtEndOfGroup = 0x19,
    SubgroupFirstObjectIdEndOfGroup = 0x1a,
    SubgroupFirstObjectIdExtEndOfGroup = 0x1b,
    SubgroupIdEndOfGroup = 0x1c,
    SubgroupIdExtEndOfGroup = 0x1d,
    Fetch = 0x5,
}

impl StreamHeaderType {
    pub fn is_subgroup(&self) -> bool {
        (0x10..=0x1d).contains(&(*self as u64))
    }

    pub fn is_fetch(&self) -> bool {
        *self == Self::Fetch
    }

    pub fn has_extensions(&self) -> bool {
        matches!(
            self,
            Self::SubgroupZeroIdExt
                | Self::SubgroupFirstObjectIdExt
                | Self::SubgroupIdExt
                | Self::SubgroupZeroIdExtEndOfGroup
                | Self::SubgroupFirstObjectIdExtEndOfGroup
                | Self::SubgroupIdExtEndOfGroup
                | Self::Fetch
        )
    }

    pub fn end_of_group(&self) -> bool {
        matches!(
            self,
            Self::SubgroupZeroIdEndOfGroup
                | Self::SubgroupZeroIdExtEndOfGroup
                | Self::SubgroupFirstObjectIdEndOfGroup
                | Self::SubgroupFirstObjectIdExtEndOfGroup
                | Self::SubgroupIdEndOfGroup
                | Self::SubgroupIdExtEndOfGroup
        )
    }

    pub fn subgroup_id_kind(&self) -> SubgroupIdKind {
        match self {
            Self::SubgroupZeroId | Self::SubgroupZeroIdExt => SubgroupIdKind::Zero,
            Self::SubgroupZeroIdEndOfGroup | Self::SubgroupZeroIdExtEndOfGroup => {
                SubgroupIdKind::Zero
            }
            Self::SubgroupFirstObjectId | Self::SubgroupFirstObjectIdExt => {
                SubgroupIdKind::FirstObject
            }
            Self::SubgroupFirstObjectIdEndOfGroup | Self::SubgroupFirstObjectIdExtEndOfGroup => {
                SubgroupIdKind::FirstObject
            }
            _ => SubgroupIdKind::Explicit,
        }
    }

    /// Pick the subgroup variant for the given properties.
    pub fn for_subgroup(kind: SubgroupIdKind, end_of_group: bool, has_extensions: bool) -> Self {
        match (kind, end_of_group, has_extensions) {
            (SubgroupIdKind::Zero, false, false) => Self::SubgroupZeroId,
            (SubgroupIdKind::Zero, false, true) => Self::SubgroupZeroIdExt,
            (SubgroupIdKind::Zero, true, false) => Self::SubgroupZeroIdEndOfGroup,
            (SubgroupIdKind::Zero, true, true) => Self::SubgroupZeroIdExtEndOfGroup,
            (SubgroupIdKind::FirstObject, false, false) => Self::SubgroupFirstObjectId,
            (SubgroupIdKind::FirstObject, false, true) => Self::SubgroupFirstObjectIdExt,
            (SubgroupIdKind::FirstObject, true, false) => Self::SubgroupFirstObjectIdEndOfGroup,
            (SubgroupIdKind::FirstObject, true, true) => Self::SubgroupFirstObjectIdExtEndOfGroup,
            (SubgroupIdKind::Explicit, false, false) => Self::SubgroupId,
            (SubgroupIdKind::Explicit, false, true) => Self::SubgroupIdExt,
            (SubgroupIdKind::Explicit, true, false) => Self::SubgroupIdEndOfGroup,
            (SubgroupIdKind::Explicit, true, true) => Self::SubgroupIdExtEndOfGroup,
        }
    }
}

impl Encode for StreamHeaderType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        (*self as u64).encode(w)?;
        Ok(())
    }
}

impl Decode for StreamHeaderType {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        Self::try_from(u64::decode(r)?)
    }
}

impl TryFrom<u64> for StreamHeaderType {
    type Error = DecodeError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        match v {
            0x10 => Ok(Self::SubgroupZeroId),
            0x11 => Ok(Self::SubgroupZeroIdExt),
            0x12 => Ok(Self::SubgroupFirstObjectId),
            0x13 => Ok(Self::SubgroupFirstObjectIdExt),
            0x14 => Ok(Self::SubgroupId),
            0x15 => Ok(Self::SubgroupIdExt),
            0x18 => Ok(Self::SubgroupZeroIdEndOfGroup),
            0x19 => Ok(Self::SubgroupZeroIdExtEndOfGroup),
            0x1a => Ok(Self::SubgroupFirstObjectIdEndOfGroup),
            0x1b => Ok(Self::SubgroupFirstObjectIdExtEndOfGroup),
            0x1c => Ok(Self::SubgroupIdEndOfGroup),
            0x1d => Ok(Self::SubgroupIdExtEndOfGroup),
            0x05 => Ok(Self::Fetch),
            other => {
                log::warn!("invalid stream header type {:#x}", other);
                Err(DecodeError::InvalidHeaderType)
            }
        }
    }
}

/// The header opening a subgroup stream; every object record that follows
/// belongs to this (group, subgroup).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubgroupHeader {
    pub header_type: StreamHeaderType,

    pub track_alias: u64,
    pub group_id: u64,

    /// Present on the wire only for the explicit-id variants.
    pub subgroup_id: Option<u64>,

    /// Publisher priority, where smaller values are sent first.
    pub priority: u8,
}

impl Decode for SubgroupHeader {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let header_type = StreamHeaderType::decode(r)?;
        if !header_type.is_subgroup() {
            return Err(DecodeError::InvalidHeaderType);
        }

        let track_alias = u64::decode(r)?;
        let group_id = u64::decode(r)?;
        let subgroup_id = match header_type.subgroup_id_kind() {
            SubgroupIdKind::Explicit => Some(u64::decode(r)?),
            SubgroupIdKind::Zero => Some(0),
            SubgroupIdKind::FirstObject => None,
        };
        let priority = u8::decode(r)?;

        Ok(Self {
            header_type,
            track_alias,
            group_id,
            subgroup_id,
            priority,
        })
    }
}

impl Encode for SubgroupHeader {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.header_type.encode(w)?;
        self.track_alias.encode(w)?;
        self.group_id.encode(w)?;
        if self.header_type.subgroup_id_kind() == SubgroupIdKind::Explicit {
            match self.subgroup_id {
                Some(subgroup_id) => subgroup_id.encode(w)?,
                None => return Err(EncodeError::MissingField("SubgroupId".to_string())),
            }
        }
        self.priority.encode(w)?;

        Ok(())
    }
}

/// One object record within a subgroup stream.
///
/// Extension presence is a property of the stream header type, so the codec
/// takes it as an argument rather than reading it from the record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubgroupObject {
    pub object_id: u64,

    pub extensions: Option<Extensions>,

    /// An empty payload carries an explicit status instead.
    pub status: Option<ObjectStatus>,
    pub payload: bytes::Bytes,
}

impl SubgroupObject {
    pub fn decode_ext<R: bytes::Buf>(
        r: &mut R,
        has_extensions: bool,
    ) -> Result<Self, DecodeError> {
        let object_id = u64::decode(r)?;
        let extensions = match has_extensions {
            true => Some(Extensions::decode(r)?),
            false => None,
        };
        let payload = bytes::Bytes::decode(r)?;
        let status = match payload.is_empty() {
            true => Some(ObjectStatus::decode(r)?),
            false => None,
        };

        Ok(Self {
            object_id,
            extensions,
            status,
            payload,
        })
    }

    pub fn encode_ext<W: bytes::BufMut>(
        &self,
        w: &mut W,
        has_extensions: bool,
    ) -> Result<(), EncodeError> {
        self.object_id.encode(w)?;
        if has_extensions {
            match &self.extensions {
                Some(extensions) => extensions.encode(w)?,
                None => return Err(EncodeError::MissingField("Extensions".to_string())),
            }
        }
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

    const ALL_SUBGROUP_TYPES: [StreamHeaderType; 12] = [
        StreamHeaderType::SubgroupZeroId,
        StreamHeaderType::SubgroupZeroIdExt,
        StreamHeaderType::SubgroupFirstObjectId,
        StreamHeaderType::SubgroupFirstObjectIdExt,
        StreamHeaderType::SubgroupId,
        StreamHeaderType::SubgroupIdExt,
        StreamHeaderType::SubgroupZeroIdEndOfGroup,
        StreamHeaderType::SubgroupZeroIdExtEndOfGroup,
        StreamHeaderType::SubgroupFirstObjectIdEndOfGroup,
        StreamHeaderType::SubgroupFirstObjectIdExtEndOfGroup,
        StreamHeaderType::SubgroupIdEndOfGroup,
        StreamHeaderType::SubgroupIdExtEndOfGroup,
    ];

    #[test]
    fn encode_decode_header() {
        for header_type in ALL_SUBGROUP_TYPES {
            let mut buf = BytesMut::new();

            let hdr = SubgroupHeader {
                header_type,
                track_alias: 0xA11CE,
                group_id: 0x1000,
                subgroup_id: Some(0x5000),
                priority: 0xA,
            };
            hdr.encode(&mut buf).unwrap();
            let decoded = SubgroupHeader::decode(&mut buf).unwrap();

            assert_eq!(decoded.header_type, header_type);
            assert_eq!(decoded.track_alias, hdr.track_alias);
            assert_eq!(decoded.group_id, hdr.group_id);
            match header_type.subgroup_id_kind() {
                SubgroupIdKind::Zero => assert_eq!(decoded.subgroup_id, Some(0)),
                SubgroupIdKind::FirstObject => assert_eq!(decoded.subgroup_id, None),
                SubgroupIdKind::Explicit => assert_eq!(decoded.subgroup_id, Some(0x5000)),
            }
        }
    }

    #[test]
    fn decode_bad_header_type() {
        let mut buf = Bytes::copy_from_slice(&[0x00]);
        let result = StreamHeaderType::decode(&mut buf);
        assert!(matches!(result, Err(DecodeError::InvalidHeaderType)));
    }

    #[test]
    fn explicit_subgroup_ten_objects() {
        // Decode a header then ten consecutive object records out of the
        // same stream buffer, emptying it.
        let header_type = StreamHeaderType::SubgroupIdExt;
        let mut buf = BytesMut::new();

        let hdr = SubgroupHeader {
            header_type,
            track_alias: 0xA11CE,
            group_id: 0x1000,
            subgroup_id: Some(0x5000),
            priority: 0xA,
        };
        hdr.encode(&mut buf).unwrap();

        let mut ext = Extensions::new();
        ext.set_bytes(0x1, vec![0x01, 0x02]);

        let mut objects = Vec::new();
        for i in 0..10 {
            let obj = SubgroupObject {
                object_id: i,
                extensions: Some(ext.clone()),
                status: None,
                payload: Bytes::from_static(&[0x1, 0x2, 0x3, 0x4, 0x5]),
            };
            obj.encode_ext(&mut buf, header_type.has_extensions())
                .unwrap();
            objects.push(obj);
        }

        let mut sbuf = StreamBuffer::new();
        sbuf.push(&buf);

        let decoded_hdr = sbuf.try_decode::<SubgroupHeader>().unwrap().unwrap();
        assert_eq!(decoded_hdr, hdr);

        for expected in &objects {
            let decoded = sbuf
                .try_decode_with(|r| SubgroupObject::decode_ext(r, header_type.has_extensions()))
                .unwrap()
                .unwrap();
            assert_eq!(&decoded, expected);
        }
        assert!(sbuf.is_empty());
    }

    #[test]
    fn empty_payload_carries_status() {
        let mut buf = BytesMut::new();

        let obj = SubgroupObject {
            object_id: 0x1234,
            extensions: None,
            status: Some(ObjectStatus::DoesNotExist),
            payload: Bytes::new(),
        };
        obj.encode_ext(&mut buf, false).unwrap();
        let decoded = SubgroupObject::decode_ext(&mut buf, false).unwrap();
        assert_eq!(decoded, obj);
    }
}
