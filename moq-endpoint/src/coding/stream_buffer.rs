use super::{Decode, DecodeError, VarInt};

use bytes::{Buf, BytesMut};
use std::io;

/// An incremental parse buffer for one stream.
///
/// Bytes arrive in arbitrary chunks; decode methods either consume a whole
/// value or leave the buffer byte-exact so the caller can retry after the
/// next read. The tag slot caches the stream's leading message type across
/// wakeups. Share between threads by wrapping in a `Mutex`; single-threaded
/// readers use it directly.
#[derive(Default)]
pub struct StreamBuffer {
    buffer: BytesMut,
    tag: Option<u64>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes from the transport.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True when at least `length` bytes are buffered.
    pub fn available(&self, length: usize) -> bool {
        self.buffer.len() >= length
    }

    /// Peek the first `length` bytes without consuming them.
    pub fn front(&self, length: usize) -> Option<&[u8]> {
        if self.available(length) {
            Some(&self.buffer[..length])
        } else {
            None
        }
    }

    /// Drop the first `length` bytes.
    pub fn pop(&mut self, length: usize) {
        let length = length.min(self.buffer.len());
        self.buffer.advance(length);
    }

    /// Read the leading varint without consuming it.
    pub fn peek_varint(&self) -> Option<u64> {
        let first = *self.buffer.first()?;
        let size = VarInt::size(first);
        let bytes = self.front(size)?;
        let mut cursor = io::Cursor::new(bytes);
        VarInt::decode(&mut cursor).ok().map(|v| v.into_inner())
    }

    /// Decode one varint, consuming it only if it is fully buffered.
    pub fn decode_varint(&mut self) -> Option<u64> {
        let first = *self.buffer.first()?;
        let size = VarInt::size(first);
        if !self.available(size) {
            return None;
        }

        let mut cursor = io::Cursor::new(&self.buffer[..size]);
        // The size check above guarantees this cannot run short.
        let value = VarInt::decode(&mut cursor).ok()?;
        self.buffer.advance(size);
        Some(value.into_inner())
    }

    /// Decode one varint-length-prefixed byte slice, all or nothing.
    pub fn decode_bytes_lp(&mut self) -> Option<Vec<u8>> {
        let first = *self.buffer.first()?;
        let prefix = VarInt::size(first);
        if !self.available(prefix) {
            return None;
        }

        let mut cursor = io::Cursor::new(&self.buffer[..prefix]);
        let length = usize::try_from(VarInt::decode(&mut cursor).ok()?).ok()?;
        if !self.available(prefix + length) {
            return None;
        }

        self.buffer.advance(prefix);
        let value = self.buffer.split_to(length);
        Some(value.to_vec())
    }

    /// Attempt a full decode of `T` against the buffered bytes.
    ///
    /// Returns `Ok(None)` and leaves the buffer untouched when the value is
    /// not yet complete; consumes exactly the decoded bytes on success.
    pub fn try_decode<T: Decode>(&mut self) -> Result<Option<T>, DecodeError> {
        let mut cursor = io::Cursor::new(&self.buffer[..]);
        match T::decode(&mut cursor) {
            Ok(value) => {
                let consumed = cursor.position() as usize;
                self.buffer.advance(consumed);
                Ok(Some(value))
            }
            Err(DecodeError::More(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Like [Self::try_decode], for values whose codec needs context beyond
    /// the bytes (e.g. whether the stream header declared extensions).
    pub fn try_decode_with<T, F>(&mut self, decode: F) -> Result<Option<T>, DecodeError>
    where
        F: for<'a> FnOnce(&mut io::Cursor<&'a [u8]>) -> Result<T, DecodeError>,
    {
        let mut cursor = io::Cursor::new(&self.buffer[..]);
        match decode(&mut cursor) {
            Ok(value) => {
                let consumed = cursor.position() as usize;
                self.buffer.advance(consumed);
                Ok(Some(value))
            }
            Err(DecodeError::More(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// The cached leading message type for this stream, if read.
    pub fn tag(&self) -> Option<u64> {
        self.tag
    }

    pub fn set_tag(&mut self, tag: u64) {
        self.tag = Some(tag);
    }

    pub fn clear_tag(&mut self) {
        self.tag = None;
    }
}
