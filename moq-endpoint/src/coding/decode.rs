use super::{BoundsExceeded, VarInt};

use std::string::FromUtf8Error;

/// Read a value from a buffer in its wire representation.
///
/// [DecodeError::More] means the buffer ended mid-value; the caller should
/// retry once more bytes arrive. Every other error is terminal.
pub trait Decode: Sized {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError>;

    /// Ensure the reader has at least `size` bytes left.
    fn decode_remaining<R: bytes::Buf>(r: &R, size: usize) -> Result<(), DecodeError> {
        let needed = size.saturating_sub(r.remaining());
        if needed > 0 {
            Err(DecodeError::More(needed))
        } else {
            Ok(())
        }
    }
}

/// A decode error.
#[derive(thiserror::Error, Debug, Clone)]
pub enum DecodeError {
    #[error("need {0} more bytes")]
    More(usize),

    #[error("varint bounds exceeded")]
    BoundsExceeded(#[from] std::num::TryFromIntError),

    #[error("varint out of range")]
    VarIntBounds(#[from] BoundsExceeded),

    #[error("invalid string")]
    InvalidString(#[from] FromUtf8Error),

    #[error("invalid message type: {0}")]
    InvalidMessage(u64),

    #[error("message length mismatch")]
    LengthMismatch,

    #[error("invalid value")]
    InvalidValue,

    #[error("invalid filter type")]
    InvalidFilterType,

    #[error("invalid group order")]
    InvalidGroupOrder,

    #[error("invalid fetch type")]
    InvalidFetchType,

    #[error("invalid object status")]
    InvalidObjectStatus,

    #[error("invalid datagram type")]
    InvalidDatagramType,

    #[error("invalid stream header type")]
    InvalidHeaderType,

    #[error("field bounds exceeded: {0}")]
    FieldBoundsExceeded(String),

    #[error("duplicate parameter: {0}")]
    DuplicateParameter(u64),

    #[error("key-value pair length exceeded")]
    KeyValuePairLengthExceeded,

    #[error("missing parameter")]
    MissingParameter,
}

impl Decode for u64 {
    /// u64 values are variable-length integers on the wire.
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        Ok(VarInt::decode(r)?.into_inner())
    }
}

impl Decode for usize {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        Ok(usize::try_from(VarInt::decode(r)?)?)
    }
}
