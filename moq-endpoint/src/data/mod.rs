//! Data messages: objects framed onto datagrams and unidirectional streams.
//!
//! Unlike control messages there is no outer length envelope; a stream
//! starts with a type varint, then a header, then repeated object records.

mod datagram;
mod extensions;
mod fetch;
mod object_status;
mod subgroup;

pub use datagram::*;
pub use extensions::*;
pub use fetch::*;
pub use object_status::*;
pub use subgroup::*;
