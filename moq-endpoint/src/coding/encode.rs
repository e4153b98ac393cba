use super::{BoundsExceeded, VarInt};

/// Write a value to a buffer in its wire representation.
pub trait Encode: Sized {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError>;

    /// Ensure the writer has room for the next `size` bytes.
    fn encode_remaining<W: bytes::BufMut>(w: &W, size: usize) -> Result<(), EncodeError> {
        let needed = size.saturating_sub(w.remaining_mut());
        if needed > 0 {
            Err(EncodeError::More(needed))
        } else {
            Ok(())
        }
    }
}

/// An encode error.
#[derive(thiserror::Error, Debug, Clone)]
pub enum EncodeError {
    #[error("short buffer")]
    More(usize),

    #[error("varint bounds exceeded")]
    BoundsExceeded(#[from] BoundsExceeded),

    #[error("field bounds exceeded: {0}")]
    FieldBoundsExceeded(String),

    #[error("invalid value")]
    InvalidValue,

    #[error("missing field: {0}")]
    MissingField(String),
}

impl Encode for u64 {
    /// u64 values are variable-length integers on the wire.
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        VarInt::try_from(*self)?.encode(w)
    }
}

impl Encode for usize {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        VarInt::try_from(*self)?.encode(w)
    }
}
