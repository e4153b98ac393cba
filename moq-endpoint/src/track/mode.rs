/// How a published track's objects are framed onto the transport.
///
/// Chosen at publish time; decides the header emitted per object and how
/// streams are reused.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TrackMode {
    /// One OBJECT_DATAGRAM per object, unreliable.
    Datagram,

    /// A fresh unidirectional stream per object.
    StreamPerObject,

    /// One stream per group; a new group opens a new stream and may drop
    /// anything still queued for the previous one.
    #[default]
    StreamPerGroup,

    /// A single stream for the whole track.
    StreamPerTrack,
}

impl TrackMode {
    pub fn is_datagram(&self) -> bool {
        matches!(self, Self::Datagram)
    }

    /// Reliable modes ride on streams.
    pub fn uses_streams(&self) -> bool {
        !self.is_datagram()
    }
}
