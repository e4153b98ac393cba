use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Parameters};
use crate::message::{FilterType, GroupOrder};

/// Sent by the subscriber to accept a Publish, scoping what it wants
/// forwarded. Carries the same filter-dependent optional groups as
/// Subscribe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishOk {
    pub request_id: u64,

    pub forward: bool,
    pub subscriber_priority: u8,
    pub group_order: GroupOrder,

    pub filter_type: FilterType,
    pub start_location: Option<Location>,
    pub end_group: Option<u64>,

    pub params: Parameters,
}

impl Decode for PublishOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let forward = bool::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
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
            forward,
            subscriber_priority,
            group_order,
            filter_type,
            start_location,
            end_group,
            params,
        })
    }
}

impl Encode for PublishOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.forward.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.group_order.encode(w)?;
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
