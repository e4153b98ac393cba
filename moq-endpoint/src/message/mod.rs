//! Control messages, sent on the single bidirectional control stream.
//!
//! Every message is framed as `type (varint) || length (varint) ||
//! payload[length]`. A payload must decode to exactly `length` bytes;
//! anything else is a protocol violation. Objects travel outside this
//! module, over dedicated unidirectional streams or datagrams (see
//! [`crate::data`]).

pub mod error_code;

mod fetch;
mod fetch_cancel;
mod fetch_error;
mod fetch_ok;
mod fetch_type;
mod filter_type;
mod go_away;
mod group_order;
mod max_request_id;
mod new_group_request;
mod publish;
mod publish_done;
mod publish_error;
mod publish_namespace;
mod publish_namespace_cancel;
mod publish_namespace_done;
mod publish_namespace_error;
mod publish_namespace_ok;
mod publish_ok;
mod requests_blocked;
mod subscribe;
mod subscribe_error;
mod subscribe_namespace;
mod subscribe_namespace_error;
mod subscribe_namespace_ok;
mod subscribe_ok;
mod subscribe_update;
mod track_status;
mod track_status_error;
mod track_status_ok;
mod unsubscribe;
mod unsubscribe_namespace;

pub use fetch::*;
pub use fetch_cancel::*;
pub use fetch_error::*;
pub use fetch_ok::*;
pub use fetch_type::*;
pub use filter_type::*;
pub use go_away::*;
pub use group_order::*;
pub use max_request_id::*;
pub use new_group_request::*;
pub use publish::*;
pub use publish_done::*;
pub use publish_error::*;
pub use publish_namespace::*;
pub use publish_namespace_cancel::*;
pub use publish_namespace_done::*;
pub use publish_namespace_error::*;
pub use publish_namespace_ok::*;
pub use publish_ok::*;
pub use requests_blocked::*;
pub use subscribe::*;
pub use subscribe_error::*;
pub use subscribe_namespace::*;
pub use subscribe_namespace_error::*;
pub use subscribe_namespace_ok::*;
pub use subscribe_ok::*;
pub use subscribe_update::*;
pub use track_status::*;
pub use track_status_error::*;
pub use track_status_ok::*;
pub use unsubscribe::*;
pub use unsubscribe_namespace::*;

use crate::coding::{Decode, DecodeError, Encode, EncodeError};
use std::fmt;

// Generate the message enum and its envelope codec from the type table
// rather than copy-paste per message.
macro_rules! control_messages {
    {$($name:ident = $val:expr,)*} => {
		/// Any control message, tagged with its wire type.
		#[derive(Clone, PartialEq)]
		pub enum ControlMessage {
			$($name($name)),*
		}

		impl Decode for ControlMessage {
			fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
				let t = u64::decode(r)?;
				let len = usize::decode(r)?;

				// Wait for the whole payload before attempting the body.
				Self::decode_remaining(r, len)?;
				let mut payload = r.copy_to_bytes(len);

				match t {
					$($val => {
						// The payload must decode to exactly `len` bytes.
						// Running short here is malformed, not retryable.
						let msg = match $name::decode(&mut payload) {
							Ok(msg) => msg,
							Err(DecodeError::More(_)) => return Err(DecodeError::LengthMismatch),
							Err(err) => return Err(err),
						};
						if bytes::Buf::has_remaining(&payload) {
							return Err(DecodeError::LengthMismatch);
						}
						Ok(Self::$name(msg))
					})*
					_ => Err(DecodeError::InvalidMessage(t)),
				}
			}
		}

		impl Encode for ControlMessage {
			fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
				match self {
					$(Self::$name(ref m) => {
						self.id().encode(w)?;

						// Encode the payload to a scratch buffer first; the
						// length prefix isn't known until the body is done.
						let mut buf = Vec::new();
						m.encode(&mut buf)?;
						buf.len().encode(w)?;

						Self::encode_remaining(w, buf.len())?;
						w.put_slice(&buf);
						Ok(())
					},)*
				}
			}
		}

		impl ControlMessage {
			pub fn id(&self) -> u64 {
				match self {
					$(Self::$name(_) => {
						$val
					},)*
				}
			}

			pub fn name(&self) -> &'static str {
				match self {
					$(Self::$name(_) => {
						stringify!($name)
					},)*
				}
			}
		}

		$(impl From<$name> for ControlMessage {
			fn from(m: $name) -> Self {
				ControlMessage::$name(m)
			}
		})*

		impl fmt::Debug for ControlMessage {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				match self {
					$(Self::$name(ref m) => m.fmt(f),)*
				}
			}
		}
    }
}

// Each message is prefixed with the given varint type.
control_messages! {
    // NOTE: Setup messages (0x20/0x21) are in the setup module.

    // SUBSCRIBE family, sent by subscriber
    SubscribeUpdate = 0x2,
    Subscribe = 0x3,
    Unsubscribe = 0xa,
    // SUBSCRIBE family, sent by publisher
    SubscribeOk = 0x4,
    SubscribeError = 0x5,

    // NAMESPACE announce family, sent by publisher
    PublishNamespace = 0x6,
    PublishNamespaceDone = 0x9,
    // NAMESPACE announce family, sent by subscriber
    PublishNamespaceOk = 0x7,
    PublishNamespaceError = 0x8,
    PublishNamespaceCancel = 0xc,

    // PUBLISH family, sent by publisher
    Publish = 0x1d,
    PublishDone = 0xb,
    // PUBLISH family, sent by subscriber
    PublishOk = 0x1e,
    PublishError = 0x1f,

    // TRACK_STATUS family, sent by subscriber
    TrackStatus = 0xd,
    // TRACK_STATUS family, sent by publisher
    TrackStatusOk = 0xe,
    TrackStatusError = 0xf,

    // NAMESPACE subscribe family, sent by subscriber
    SubscribeNamespace = 0x11,
    UnsubscribeNamespace = 0x14,
    // NAMESPACE subscribe family, sent by publisher
    SubscribeNamespaceOk = 0x12,
    SubscribeNamespaceError = 0x13,

    // FETCH family, sent by subscriber
    Fetch = 0x16,
    FetchCancel = 0x17,
    // FETCH family, sent by publisher
    FetchOk = 0x18,
    FetchError = 0x19,

    // Misc
    GoAway = 0x10,
    MaxRequestId = 0x15,
    RequestsBlocked = 0x1a,
    NewGroupRequest = 0x42,
}
