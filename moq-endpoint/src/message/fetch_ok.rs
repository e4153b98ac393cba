use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Parameters};
use crate::message::GroupOrder;

/// Sent by the publisher to accept a Fetch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchOk {
    pub request_id: u64,

    pub group_order: GroupOrder,

    /// Set when the fetch range runs to the end of the track.
    pub end_of_track: bool,
    pub end_location: Location,

    pub params: Parameters,
}

impl Decode for FetchOk {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let end_of_track = bool::decode(r)?;
        let end_location = Location::decode(r)?;
        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            group_order,
            end_of_track,
            end_location,
            params,
        })
    }
}

impl Encode for FetchOk {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.group_order.encode(w)?;
        self.end_of_track.encode(w)?;
        self.end_location.encode(w)?;
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

        let msg = FetchOk {
            request_id: 12345,
            group_order: GroupOrder::Descending,
            end_of_track: true,
            end_location: Location::new(50, 10),
            params: Parameters::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = FetchOk::decode(&mut buf).unwrap();
        assert_eq!(decoded, msg);
    }
}
