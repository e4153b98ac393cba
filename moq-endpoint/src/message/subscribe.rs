use crate::coding::{
    Decode, DecodeError, Encode, EncodeError, Location, Parameters, TrackNamespace,
};
use crate::message::{FilterType, GroupOrder};

/// Sent by the subscriber to request all future objects for a track.
///
/// The start location and end group are present on the wire only for the
/// absolute filter types; the filter already decoded dictates whether to
/// read them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subscribe {
    pub request_id: u64,

    pub track_namespace: TrackNamespace,
    pub track_name: Vec<u8>,

    /// Priority of this subscription relative to the subscriber's others,
    /// where smaller values are delivered first.
    pub subscriber_priority: u8,
    pub group_order: GroupOrder,

    /// Whether the publisher should forward objects immediately.
    pub forward: bool,

    pub filter_type: FilterType,
    pub start_location: Option<Location>,
    pub end_group: Option<u64>,

    pub params: Parameters,
}

impl Decode for Subscribe {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = Vec::<u8>::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let forward = bool::decode(r)?;
        let filter_type = FilterType::decode(r)?;

        let start_location = match filter_type.has_start() {
            true => Some(Location::decode(r)?),
            false => None,
        };
        let end_group = match filter_type.has_end() {
            true => Some(u64::decode(r)?),
            false => None,
        };

        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            track_namespace,
            track_name,
            subscriber_priority,
            group_order,
            forward,
            filter_type,
            start_location,
            end_group,
            params,
        })
    }
}

impl Encode for Subscribe {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.group_order.encode(w)?;
        self.forward.encode(w)?;
        self.filter_type.encode(w)?;

        if self.filter_type.has_start() {
            match &self.start_location {
                Some(start) => start.encode(w)?,
                None => return Err(EncodeError::MissingField("StartLocation".to_string())),
            }
        }
        if self.filter_type.has_end() {
            match self.end_group {
                Some(end) => end.encode(w)?,
                None => return Err(EncodeError::MissingField("EndGroup".to_string())),
            }
        }

        self.params.encode(w)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn subscribe(filter_type: FilterType) -> Subscribe {
        Subscribe {
            request_id: 0x1,
            track_namespace: TrackNamespace::from_utf8_path("conf.example.com/conf/1"),
            track_name: b"alice/video".to_vec(),
            subscriber_priority: 0x10,
            group_order: GroupOrder::Ascending,
            forward: true,
            filter_type,
            start_location: None,
            end_group: None,
            params: Parameters::default(),
        }
    }

    #[test]
    fn encode_decode_latest() {
        let mut buf = BytesMut::new();

        // No optional groups for the latest filters.
        for filter_type in [FilterType::LatestGroup, FilterType::LatestObject] {
            let msg = subscribe(filter_type);
            msg.encode(&mut buf).unwrap();
            let decoded = Subscribe::decode(&mut buf).unwrap();
            assert_eq!(decoded, msg);
            assert_eq!(decoded.start_location, None);
            assert_eq!(decoded.end_group, None);
        }
    }

    #[test]
    fn encode_decode_absolute_start() {
        let mut buf = BytesMut::new();

        let mut msg = subscribe(FilterType::AbsoluteStart);
        msg.start_location = Some(Location::new(0x1000, 0x1));
        msg.encode(&mut buf).unwrap();
        let decoded = Subscribe::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.end_group, None);
    }

    #[test]
    fn encode_decode_absolute_range() {
        let mut buf = BytesMut::new();

        // Both optional groups populated, no parameters.
        let mut msg = subscribe(FilterType::AbsoluteRange);
        msg.start_location = Some(Location::new(0x1000, 0x1));
        msg.end_group = Some(0xFFF);
        msg.encode(&mut buf).unwrap();
        let decoded = Subscribe::decode(&mut buf).unwrap();
        assert_eq!(decoded.start_location, Some(Location::new(0x1000, 0x1)));
        assert_eq!(decoded.end_group, Some(0xFFF));
        assert_eq!(decoded.subscriber_priority, 0x10);
        assert_eq!(decoded.group_order, GroupOrder::Ascending);
        assert!(decoded.params.is_empty());
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_missing_fields() {
        let mut buf = BytesMut::new();

        // AbsoluteRange without a start location
        let msg = subscribe(FilterType::AbsoluteRange);
        let encoded = msg.encode(&mut buf);
        assert!(matches!(encoded.unwrap_err(), EncodeError::MissingField(_)));
    }
}
