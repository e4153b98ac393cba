use crate::coding::{
    Decode, DecodeError, Encode, EncodeError, Location, Parameters, TrackNamespace,
};
use crate::message::GroupOrder;

/// Sent by the publisher to push a track to the peer without waiting for a
/// Subscribe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Publish {
    pub request_id: u64,

    pub track_namespace: TrackNamespace,
    pub track_name: Vec<u8>,
    pub track_alias: u64,

    pub group_order: GroupOrder,

    pub content_exists: bool,
    pub largest_location: Option<Location>,

    pub forward: bool,

    pub params: Parameters,
}

impl Decode for Publish {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let request_id = u64::decode(r)?;
        let track_namespace = TrackNamespace::decode(r)?;
        let track_name = Vec::<u8>::decode(r)?;
        let track_alias = u64::decode(r)?;
        let group_order = GroupOrder::decode(r)?;
        let content_exists = bool::decode(r)?;
        let largest_location = match content_exists {
            true => Some(Location::decode(r)?),
            false => None,
        };
        let forward = bool::decode(r)?;
        let params = Parameters::decode(r)?;

        Ok(Self {
            request_id,
            track_namespace,
            track_name,
            track_alias,
            group_order,
            content_exists,
            largest_location,
            forward,
            params,
        })
    }
}

impl Encode for Publish {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        self.request_id.encode(w)?;
        self.track_namespace.encode(w)?;
        self.track_name.encode(w)?;
        self.track_alias.encode(w)?;
        self.group_order.encode(w)?;
        self.content_exists.encode(w)?;
        if self.content_exists {
            match &self.largest_location {
                Some(largest) => largest.encode(w)?,
                None => return Err(EncodeError::MissingField("LargestLocation".to_string())),
            }
        }
        self.forward.encode(w)?;
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

        for largest in [None, Some(Location::new(2, 3))] {
            let msg = Publish {
                request_id: 7,
                track_namespace: TrackNamespace::from_utf8_path("conf.example.com/conf/1"),
                track_name: b"alice/video".to_vec(),
                track_alias: 0xA11CE,
                group_order: GroupOrder::Ascending,
                content_exists: largest.is_some(),
                largest_location: largest,
                forward: true,
                params: Parameters::default(),
            };
            msg.encode(&mut buf).unwrap();
            let decoded = Publish::decode(&mut buf).unwrap();
            assert_eq!(decoded, msg);
        }
    }
}
