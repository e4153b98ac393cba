use crate::coding::{Decode, DecodeError, Encode, EncodeError, Location, Parameters};
use crate::message::GroupOrder;

/// Sent by the publisher to accept a Subscribe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeOk {
    /// The request ID of the SUBSCRIBE this message is replying to.
    pub request_id: u64,

    /// The identifier used for this track in subgroups or datagrams.
    pub track_alias: u64,

    /// The time in milliseconds after which the subscription is no longer valid.
    pub expires: u64,

    pub group_order: GroupOrder,

    /// If set, `largest_location` is the largest object available for this
    /// track.
    pub content_exists: bool,
    pub largest_location: Option<Location>,

    pub params: Parameters,
}

impl Decode for SubscribeOk {
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

impl Encode for SubscribeOk {
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

        let msg = SubscribeOk {
            request_id: 0x1,
            track_alias: 0xA11CE,
            expires: 0x100,
            group_order: GroupOrder::Ascending,
            content_exists: true,
            largest_location: Some(Location::new(0x64, 0xC8)),
            params: Parameters::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeOk::decode(&mut buf).unwrap();
        assert_eq!(decoded.largest_location, Some(Location::new(0x64, 0xC8)));
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_decode_no_content() {
        let mut buf = BytesMut::new();

        // The largest location is absent when content_exists is 0.
        let msg = SubscribeOk {
            request_id: 0x1,
            track_alias: 0xA11CE,
            expires: 0x100,
            group_order: GroupOrder::Publisher,
            content_exists: false,
            largest_location: None,
            params: Parameters::default(),
        };
        msg.encode(&mut buf).unwrap();
        let decoded = SubscribeOk::decode(&mut buf).unwrap();
        assert_eq!(decoded.largest_location, None);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_missing_fields() {
        let mut buf = BytesMut::new();

        let msg = SubscribeOk {
            request_id: 0x1,
            track_alias: 100,
            expires: 3600,
            group_order: GroupOrder::Publisher,
            content_exists: true,
            largest_location: None,
            params: Parameters::default(),
        };
        let encoded = msg.encode(&mut buf);
        assert!(matches!(encoded.unwrap_err(), EncodeError::MissingField(_)));
    }
}
