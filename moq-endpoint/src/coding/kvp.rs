use crate::coding::{Decode, DecodeError, Encode, EncodeError};

use std::fmt;

/// A parameter value, classified by the parity of its key.
///
/// Even keys carry a single varint; odd keys carry opaque bytes. Even values
/// are held as up to 8 little-endian bytes so that peers padding with
/// trailing zeros still compare equal.
#[derive(Clone, Eq)]
pub enum Value {
    Int(u64),
    Bytes(Vec<u8>),
}

impl Value {
    /// The numeric value of an even-key parameter, if this is one.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            Value::Int(_) => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            // Numeric comparison tolerates a little-endian byte rendering
            // with trailing zeros.
            (Value::Int(a), Value::Bytes(b)) | (Value::Bytes(b), Value::Int(a)) => {
                if b.len() > 8 {
                    return false;
                }
                let mut le = [0u8; 8];
                le[..b.len()].copy_from_slice(b);
                u64::from_le_bytes(le) == *a
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Bytes(bytes) => {
                let preview: Vec<String> =
                    bytes.iter().take(16).map(|b| format!("{:02X}", b)).collect();
                write!(f, "[{}]", preview.join(" "))
            }
        }
    }
}

/// A single key-value pair.
#[derive(Clone, Eq, PartialEq)]
pub struct KeyValuePair {
    pub key: u64,
    pub value: Value,
}

impl KeyValuePair {
    pub fn new_int(key: u64, value: u64) -> Self {
        Self {
            key,
            value: Value::Int(value),
        }
    }

    pub fn new_bytes(key: u64, value: Vec<u8>) -> Self {
        Self {
            key,
            value: Value::Bytes(value),
        }
    }
}

impl Decode for KeyValuePair {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let key = u64::decode(r)?;

        if key % 2 == 0 {
            // Even: single varint value
            let value = u64::decode(r)?;
            Ok(KeyValuePair::new_int(key, value))
        } else {
            // Odd: length-prefixed bytes
            let length = usize::decode(r)?;
            if length > u16::MAX as usize {
                log::error!(
                    "kvp length exceeded: key={} length={} (max={})",
                    key,
                    length,
                    u16::MAX
                );
                return Err(DecodeError::KeyValuePairLengthExceeded);
            }

            Self::decode_remaining(r, length)?;
            let mut buf = vec![0; length];
            r.copy_to_slice(&mut buf);
            Ok(KeyValuePair::new_bytes(key, buf))
        }
    }
}

impl Encode for KeyValuePair {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        match &self.value {
            Value::Int(v) => {
                // varint values require an even key
                if self.key % 2 != 0 {
                    return Err(EncodeError::InvalidValue);
                }
                self.key.encode(w)?;
                (*v).encode(w)?;
                Ok(())
            }
            Value::Bytes(v) => {
                // byte values require an odd key
                if self.key % 2 == 0 {
                    return Err(EncodeError::InvalidValue);
                }
                self.key.encode(w)?;
                v.encode(w)?;
                Ok(())
            }
        }
    }
}

impl fmt::Debug for KeyValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}: {:?}}}", self.key, self.value)
    }
}

/// An ordered parameter list: a varint count followed by that many pairs.
///
/// Used for both setup parameters and version parameters; the key constants
/// differ per context. Duplicate keys are a decode error.
#[derive(Default, Clone, Eq, PartialEq)]
pub struct Parameters(pub Vec<KeyValuePair>);

impl Parameters {
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

    pub fn get_int(&self, key: u64) -> Option<u64> {
        self.get(key).and_then(|k| k.value.as_int())
    }

    pub fn get_bytes(&self, key: u64) -> Option<&[u8]> {
        self.get(key).and_then(|k| k.value.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decode for Parameters {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let count = usize::decode(r)?;

        let mut params = Vec::new();
        for _ in 0..count {
            let kvp = KeyValuePair::decode(r)?;
            if params.iter().any(|k: &KeyValuePair| k.key == kvp.key) {
                return Err(DecodeError::DuplicateParameter(kvp.key));
            }
            params.push(kvp);
        }

        Ok(Parameters(params))
    }
}

impl Encode for Parameters {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.0.len().encode(w)?;
        for kvp in &self.0 {
            kvp.encode(w)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Parameters {
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
