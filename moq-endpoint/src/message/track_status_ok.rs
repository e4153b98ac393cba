use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Parameters};
use crate::message::GroupOrder;

/// Sent by the publisher in response to a TrackStatus query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrackStatusOk {
    pub request_id: u64,

    pub track_alias: u64,
    pub expires: u64,
    pub group_order: GroupOrder,

    pub content_exists: bool,
    pub largest_location: Option<Location>,

    pub params: Parameters,
}

impl Decode for TrackStatusOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let track_alias = u64::decode(r)?;
        let expires = u64::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let content_exists = bool::decode(r)?;
        let largest_location = match content_exists {
            true => Some(Location::decode(r)?),
            false => None,
        };
        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            track_alias,
            expires,
            group_order,
            content_exists,
            largest_location,
            params,
        })
    }
}

impl Encode for TrackStatusOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.track_alias.encode(w)?;
        self.expires.encode(w)?;
        self.group_order.encode(w)?;
        self.content_exists.encode(w)?;
        if self.content_exists {
            match &self.largest_location {
                Some(largest) => largest.encode(w)?,
                None => return Err(EncodeError::MissingField("LargestLocation".to_string())),
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

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        for largest in [None, Some(Location::new(100, 200))] {
            let msg = TrackStatusOk {
                request_id: 9,
                track_alias: 0xA11CE,
                expires: 3600,
                group_order: GroupOrder::Ascending,
                content_exists: largest.is_some(),
                largest_location: largest,
                params: Parameters::default(),
            };
            msg.encode(&mut buf).unwrap();
            let decoded = TrackStatusOk::decode(&mut buf).unwrap();
            assert_eq!(decoded, msg);
        }
    }
}
