//! Named wire codes carried in error and status fields.
//!
//! The message structs keep the raw `u64`; these constants give the engine
//! and applications names for the values they react to.

/// SUBSCRIBE_ERROR codes.
pub mod subscribe_error {
    pub const INTERNAL_ERROR: u64 = 0x0;
    pub const UNAUTHORIZED: u64 = 0x1;
    pub const TIMEOUT: u64 = 0x2;
    pub const NOT_SUPPORTED: u64 = 0x3;
    pub const TRACK_DOES_NOT_EXIST: u64 = 0x4;
    pub const INVALID_RANGE: u64 = 0x5;
    pub const RETRY_TRACK_ALIAS: u64 = 0x6;
}

/// PUBLISH_NAMESPACE_ERROR codes.
pub mod publish_namespace_error {
    pub const INTERNAL_ERROR: u64 = 0x0;
    pub const UNAUTHORIZED: u64 = 0x1;
    pub const TIMEOUT: u64 = 0x2;
    pub const NOT_SUPPORTED: u64 = 0x3;
    pub const UNINTERESTED: u64 = 0x4;
}

/// FETCH_ERROR codes.
pub mod fetch_error {
    pub const INTERNAL_ERROR: u64 = 0x0;
    pub const UNAUTHORIZED: u64 = 0x1;
    pub const TIMEOUT: u64 = 0x2;
    pub const NOT_SUPPORTED: u64 = 0x3;
    pub const TRACK_DOES_NOT_EXIST: u64 = 0x4;
    pub const INVALID_RANGE: u64 = 0x5;
}

/// PUBLISH_DONE status codes.
pub mod publish_done {
    pub const INTERNAL_ERROR: u64 = 0x0;
    pub const UNAUTHORIZED: u64 = 0x1;
    pub const TRACK_ENDED: u64 = 0x2;
    pub const SUBSCRIPTION_ENDED: u64 = 0x3;
    pub const GOING_AWAY: u64 = 0x4;
    pub const EXPIRED: u64 = 0x5;
    pub const TOO_FAR_BEHIND: u64 = 0x6;
}
