use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use crate::data::{Extensions, ObjectStatus};

/// The first varint of every object datagram: two payload-carrying bits
/// ({end-of-group} x {extensions}) plus two status-only variants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DatagramType {
    NotEndOfGroupNoExtensions = 0x0,
    NotEndOfGroupWithExtensions = 0x1,
    EndOfGroupNoExtensions = 0x2,
    EndOfGroupWithExtensions = 0x3,
    StatusNoExtensions = 0x4,
    StatusWithExtensions = 0x5,
}

impl DatagramType {
    pub fn has_extensions(&self) -> bool {
        matches!(
            self,
            Self::NotEndOfGroupWithExtensions
                | Self::EndOfGroupWithExtensions
                | Self::StatusWithExtensions
        )
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::StatusNoExtensions | Self::StatusWithExtensions)
    }

    pub fn end_of_group(&self) -> bool {
        matches!(
            self,
            Self::EndOfGroupNoExtensions | Self::EndOfGroupWithExtensions
        )
    }

    /// Pick the object variant for the given properties.
    pub fn for_object(end_of_group: bool, has_extensions: bool) -> Self {
        match (end_of_group, has_extensions) {
            (false, false) => Self::NotEndOfGroupNoExtensions,
            (false, true) => Self::NotEndOfGroupWithExtensions,
            (true, false) => Self::EndOfGroupNoExtensions,
            (true, true) => Self::EndOfGroupWithExtensions,
        }
    }
}

impl Decode for DatagramType {
    fn decode<B: bytes::Buf>(r: &mut B) -> Result<Self, DecodeError> {
        match u64::decode(r)? {
            0x0 => Ok(Self::NotEndOfGroupNoExtensions),
            0x1 => Ok(Self::NotEndOfGroupWithExtensions),
            0x2 => Ok(Self::EndOfGroupNoExtensions),
            0x3 => Ok(Self::EndOfGroupWithExtensions),
            0x4 => Ok(Self::StatusNoExtensions),
            0x5 => Ok(Self::StatusWithExtensions),
            _ => Err(DecodeError::InvalidDatagramType),
        }
    }
}

impl Encode for DatagramType {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        (*self as u64).encode(w)?;
        Ok(())
    }
}

/// One object (or object status) delivered as a single QUIC datagram.
///
/// The payload runs to the end of the datagram; the status variants carry an
/// [ObjectStatus] instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectDatagram {
    pub datagram_type: DatagramType,

    pub track_alias: u64,
    pub group_id: u64,
    pub object_id: u64,

    /// Publisher priority, where smaller values are sent first.
    pub priority: u8,

    pub extensions: Option<Extensions>,

    pub status: Option<ObjectStatus>,
    pub payload: Option<bytes::Bytes>,
}

impl Decode for ObjectDatagram {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let datagram_type = DatagramType::decode(r)?;
        let track_alias = u64::decode(r)?;
        let group_id = u64::decode(r)?;
        let object_id = u64::decode(r)?;
        let priority = u8::decode(r)?;

        let extensions = match datagram_type.has_extensions() {
            true => Some(Extensions::decode(r)?),
            false => None,
        };

        let status;
        let payload;
        if datagram_type.is_status() {
            status = Some(ObjectStatus::decode(r)?);
            payload = None;
        } else {
            status = None;
            payload = Some(r.copy_to_bytes(r.remaining()));
        }

        Ok(Self {
            datagram_type,
            track_alias,
            group_id,
            object_id,
            priority,
            extensions,
            status,
            payload,
        })
    }
}

impl Encode for ObjectDatagram {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.datagram_type.encode(w)?;
        self.track_alias.encode(w)?;
        self.group_id.encode(w)?;
        self.object_id.encode(w)?;
        self.priority.encode(w)?;

        if self.datagram_type.has_extensions() {
            match &self.extensions {
                Some(extensions) => extensions.encode(w)?,
                None => return Err(EncodeError::MissingField("Extensions".to_string())),
            }
        }

        if self.datagram_type.is_status() {
            match &self.status {
                Some(status) => status.encode(w)?,
                None => return Err(EncodeError::MissingField("Status".to_string())),
            }
        } else {
            match &self.payload {
                Some(payload) => {
                    Self::encode_remaining(w, payload.len())?;
                    w.put_slice(payload);
                }
                None => return Err(EncodeError::MissingField("Payload".to_string())),
            }
        }

        Ok(())
    }
}
