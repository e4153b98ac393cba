use crate::coding::{self, DecodeError};
use crate::setup;

/// Session termination reason codes sent in CONNECTION_CLOSE.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u64)]
pub enum TerminationReason {
    NoError = 0x0,
    InternalError = 0x1,
    Unauthorized = 0x2,
    ProtocolViolation = 0x3,
    InvalidRequestId = 0x4,
    DuplicateTrackAlias = 0x5,
    KeyValueFormattingError = 0x6,
    TooManyRequests = 0x7,
    InvalidPath = 0x8,
    MalformedPath = 0x9,
    GoAwayTimeout = 0x10,
    ControlMessageTimeout = 0x11,
    DataStreamTimeout = 0x12,
    AuthTokenCacheOverflow = 0x13,
    DuplicateAuthTokenAlias = 0x14,
    VersionNegotiationFailed = 0x15,
    MalformedAuthToken = 0x16,
    UnknownAuthTokenAlias = 0x17,
    ExpiredAuthToken = 0x18,
}

/// Anything that can take the session down or fail an API call.
#[derive(thiserror::Error, Debug, Clone)]
pub enum SessionError {
    #[error("webtransport session: {0}")]
    Session(#[from] web_transport::SessionError),

    #[error("webtransport write: {0}")]
    Write(#[from] web_transport::WriteError),

    #[error("webtransport read: {0}")]
    Read(#[from] web_transport::ReadError),

    #[error("encode error: {0}")]
    Encode(#[from] coding::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] coding::DecodeError),

    #[error("unsupported versions: offered={0:?} supported={1:?}")]
    Version(setup::Versions, setup::Versions),

    /// The peer proposed a track alias already bound to another track.
    #[error("duplicate track alias")]
    DuplicateTrackAlias,

    /// A track is already published under this name on this connection.
    #[error("duplicate track")]
    DuplicateTrack,

    /// The peer's MAX_REQUEST_ID does not allow another request.
    #[error("too many requests")]
    TooManyRequests,

    #[error("protocol violation")]
    ProtocolViolation,

    /// The session is not in a state to accept this operation.
    #[error("not connected")]
    NotConnected,

    #[error("internal error")]
    Internal,
}

impl SessionError {
    /// The termination reason reported to the peer when this error closes
    /// the connection.
    pub fn reason(&self) -> TerminationReason {
        match self {
            Self::Session(_) | Self::Read(_) | Self::Write(_) => TerminationReason::InternalError,
            Self::Encode(_) | Self::Internal => TerminationReason::InternalError,
            Self::NotConnected => TerminationReason::NoError,
            Self::Version(..) => TerminationReason::VersionNegotiationFailed,
            Self::DuplicateTrackAlias => TerminationReason::DuplicateTrackAlias,
            Self::DuplicateTrack => TerminationReason::InternalError,
            Self::TooManyRequests => TerminationReason::TooManyRequests,
            Self::ProtocolViolation => TerminationReason::ProtocolViolation,
            Self::Decode(err) => match err {
                DecodeError::DuplicateParameter(_) | DecodeError::KeyValuePairLengthExceeded => {
                    TerminationReason::KeyValueFormattingError
                }
                _ => TerminationReason::ProtocolViolation,
            },
        }
    }

    /// The numeric code sent over the wire.
    pub fn code(&self) -> u64 {
        self.reason() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(SessionError::ProtocolViolation.code(), 0x3);
        assert_eq!(SessionError::DuplicateTrackAlias.code(), 0x5);
        assert_eq!(SessionError::TooManyRequests.code(), 0x7);
        assert_eq!(
            SessionError::Version(vec![].into(), vec![].into()).code(),
            0x15
        );
        assert_eq!(
            SessionError::Decode(DecodeError::DuplicateParameter(2)).code(),
            0x6
        );
        assert_eq!(
            SessionError::Decode(DecodeError::LengthMismatch).code(),
            0x3
        );
    }
}
