use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Parameters};

/// Sent by the subscriber to re-scope an existing subscription.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeUpdate {
    pub request_id: u64,

    /// The request ID of the subscription being updated.
    pub subscription_request_id: u64,

    pub start_location: Location,
    pub end_group: u64,

    pub subscriber_priority: u8,
    pub forward: bool,

    pub params: Parameters,
}

impl Decode for SubscribeUpdate {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let subscription_request_id = u64::decode(r)?;
        let start_location = Location::decode(r)?;
        let end_group = u64::decode(r)?;
        let subscriber_priority = u8::decode(r)?;
        let forward = bool::decode(r)?;
        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            subscription_request_id,
            start_location,
            end_group,
            subscriber_priority,
            forward,
            params,
        })
    }
}

impl Encode for SubscribeUpdate {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.subscription_request_id.encode(w)?;
        self.start_location.encode(w)?;
        self.end_group.encode(w)?;
        self.subscriber_priority.encode(w)?;
        self.forward.encode(w)?;
        self.params.encode(w)?;

        Ok(())
    }
}
