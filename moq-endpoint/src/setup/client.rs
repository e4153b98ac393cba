use super::Versions;
use crate::coding::{Decode, DecodeError, Encode, EncodeError, Parameters};

/// Sent by the client as the first message on the control stream.
#[derive(Clone, Debug)]
pub struct ClientSetup {
    /// The list of supported versions in preferred order.
    pub supported_versions: Versions,

    /// Setup parameters: endpoint id, max request id, auth token, path.
    pub setup_parameters: Parameters,
}

impl ClientSetup {
    pub const TYPE: u64 = 0x20;
}

impl Decode for ClientSetup {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let typ = u64::decode(r)?;
        if typ != Self::TYPE {
            return Err(DecodeError::InvalidMessage(typ));
        }

        let len = usize::decode(r)?;
        Self::decode_remaining(r, len)?;
        let mut payload = r.copy_to_bytes(len);

        let supported_versions = Versions::decode(&mut payload)?;
        let setup_parameters = Parameters::decode(&mut payload)?;

        if bytes::Buf::has_remaining(&payload) {
            return Err(DecodeError::LengthMismatch);
        }

        Ok(Self {
            supported_versions,
            setup_parameters,
        })
    }
}

impl Encode for ClientSetup {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::TYPE.encode(w)?;

        // The length prefix isn't known until the payload is encoded.
        let mut buf = Vec::new();
        self.supported_versions.encode(&mut buf)?;
        self.setup_parameters.encode(&mut buf)?;

        buf.len().encode(w)?;
        Self::encode_remaining(w, buf.len())?;
        w.put_slice(&buf);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::{setup_parameter, Version};
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut params = Parameters::default();
        params.set_bytes(setup_parameter::ENDPOINT_ID, b"moq-client".to_vec());
        params.set_int(setup_parameter::MAX_REQUEST_ID, 1000);

        let client = ClientSetup {
            supported_versions: [Version::DRAFT_14].into(),
            setup_parameters: params,
        };

        client.encode(&mut buf).unwrap();
        assert_eq!(buf[0], 0x20); // CLIENT_SETUP

        let decoded = ClientSetup::decode(&mut buf).unwrap();
        assert_eq!(decoded.supported_versions, client.supported_versions);
        assert_eq!(decoded.setup_parameters, client.setup_parameters);
    }

    #[test]
    fn decode_wrong_type() {
        let mut buf = BytesMut::new();
        let server = crate::setup::ServerSetup {
            selected_version: Version::DRAFT_14,
            setup_parameters: Parameters::default(),
        };
        server.encode(&mut buf).unwrap();

        let decoded = ClientSetup::decode(&mut buf);
        assert!(matches!(
            decoded.unwrap_err(),
            DecodeError::InvalidMessage(0x21)
        ));
    }
}
