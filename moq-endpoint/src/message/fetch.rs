use crate::coding::{
    Decode, DecodeError, Encode, EncodeError, Location, Parameters, TrackNamespace,
};
use crate::message::{FetchType, GroupOrder};

/// The track and range of a standalone fetch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StandaloneFetch {
    pub track_namespace: TrackNamespace,
    pub track_name: Vec<u8>,
    pub start_location: Location,
    pub end_location: Location,
}

impl Decode for StandaloneFetch {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = Vec::<u8>::decode(r)?;
        let start_location = Location::decode(r)?;
        let end_location = Location::decode(r)?;

        Ok(Self {
            track_namespace,
            track_name,
            start_location,
            end_location,
        })
    }
}

impl Encode for StandaloneFetch {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;
        self.start_location.encode(w)?;
        self.end_location.encode(w)?;

        Ok(())
    }
}

/// A fetch that joins an existing subscription, starting a number of groups
/// before its current group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoiningFetch {
    /// The request ID of the subscription being joined.
    pub joining_request_id: u64,
    pub joining_start: u64,
}

impl Decode for JoiningFetch {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let joining_request_id = u64::decode(r)?;
        let joining_start = u64::decode(r)?;

        Ok(Self {
            joining_request_id,
            joining_start,
        })
    }
}

impl Encode for JoiningFetch {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.joining_request_id.encode(w)?;
        self.joining_start.encode(w)?;

        Ok(())
    }
}

/// Sent by the subscriber to retrieve a range of already published objects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fetch {
    pub request_id: u64,

    pub subscriber_priority: u8,
    pub group_order: GroupOrder,

    /// Which of the two sub-records follows.
    pub fetch_type: FetchType,
    pub standalone: Option<StandaloneFetch>,
    pub joining: Option<JoiningFetch>,

    pub params: Parameters,
}

impl Decode for Fetch {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let fetch_type = FetchType::decode(r)?;

        let standalone;
        let joining;
        match fetch_type {
            FetchType::Standalone => {
                standalone = Some(StandaloneFetch::decode(r)?);
                joining = None;
            }
            FetchType::Joining => {
                standalone = None;
                joining = Some(JoiningFetch::decode(r)?);
            }
        };

        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            subscriber_priority,
            group_order,
            fetch_type,
            standalone,
            joining,
            params,
        })
    }
}

impl Encode for Fetch {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.group_order.encode(w)?;
        self.fetch_type.encode(w)?;

        match self.fetch_type {
            FetchType::Standalone => match &self.standalone {
                Some(standalone) => standalone.encode(w)?,
                None => return Err(EncodeError::MissingField("StandaloneFetch".to_string())),
            },
            FetchType::Joining => match &self.joining {
                Some(joining) => joining.encode(w)?,
                None => return Err(EncodeError::MissingField("JoiningFetch".to_string())),
            },
        };

        self.params.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn encode_decode_standalone() {
        let mut buf = BytesMut::new();

        let mut params = Parameters::new();
        params.set_bytes(123, vec![0x00, 0x01, 0x02, 0x03]);

        let msg = Fetch {
            request_id: 12345,
            subscriber_priority: 127,
            group_order: GroupOrder::Publisher,
            fetch_type: FetchType::Standalone,
            standalone: Some(StandaloneFetch {
                track_namespace: TrackNamespace::from_utf8_path("conf.example.com/conf/1"),
                track_name: b"alice/video".to_vec(),
                start_location: Location::new(34, 53),
                end_location: Location::new(50, 0),
            }),
            joining: None,
            params,
        };
        msg.encode(&mut buf).unwrap();
        let decoded = Fetch::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_decode_joining() {
        let mut buf = BytesMut::new();

        let msg = Fetch {
            request_id: 12345,
            subscriber_priority: 127,
            group_order: GroupOrder::Ascending,
            fetch_type: FetchType::Joining,
            standalone: None,
            joining: Some(JoiningFetch {
                joining_request_id: 382,
                joining_start: 3463,
            }),
            params: Parameters::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = Fetch::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_missing_fields() {
        let mut buf = BytesMut::new();

        let msg = Fetch {
            request_id: 12345,
            subscriber_priority: 127,
            group_order: GroupOrder::Publisher,
            fetch_type: FetchType::Standalone,
            standalone: None,
            joining: None,
            params: Parameters::default(),
        };
        let encoded = msg.encode(&mut buf);
        assert!(matches!(encoded.unwrap_err(), EncodeError::MissingField(_)));
    }
}
