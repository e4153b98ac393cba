use super::Version;
use crate::coding::{Decode, DecodeError, Encode, EncodeError, Parameters};

/// Sent by the server in response to a ClientSetup, selecting exactly one
/// of the offered versions.
#[derive(Clone, Debug)]
pub struct ServerSetup {
    pub selected_version: Version,

    pub setup_parameters: Parameters,
}

impl ServerSetup {
    pub const TYPE: u64 = 0x21;
}

impl Decode for ServerSetup {
    fn decode<R: bytes::Buf>(r: &mut R) -> Result<Self, DecodeError> {
        let typ = u64::decode(r)?;
        if typ != Self::TYPE {
            return Err(DecodeError::InvalidMessage(typ));
        }

        let len = usize::decode(r)?;
        Self::decode_remaining(r, len)?;
        let mut payload = r.copy_to_bytes(len);

        let selected_version = Version::decode(&mut payload)?;
        let setup_parameters = Parameters::decode(&mut payload)?;

        if bytes::Buf::has_remaining(&payload) {
            return Err(DecodeError::LengthMismatch);
        }

        Ok(Self {
            selected_version,
            setup_parameters,
        })
    }
}

impl Encode for ServerSetup {
    fn encode<W: bytes::BufMut>(&self, w: &mut W) -> Result<(), EncodeError> {
        Self::TYPE.encode(w)?;

        let mut buf = Vec::new();
        self.selected_version.encode(&mut buf)?;
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
    use crate::setup::setup_parameter;
    use bytes::BytesMut;

    #[test]
    fn encode_decode() {
        let mut buf = BytesMut::new();

        let mut params = Parameters::default();
        params.set_int(setup_parameter::MAX_REQUEST_ID, 1000);

        let server = ServerSetup {
            selected_version: Version::DRAFT_14,
            setup_parameters: params,
        };

        server.encode(&mut buf).unwrap();

        #[rustfmt::skip]
        assert_eq!(
            buf.to_vec(),
            vec![
                0x21, // SERVER_SETUP
                0x0c, // Length
                0xC0, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x0E, // DRAFT_14 (0xff00000e)
                0x01, // 1 parameter
                0x02, 0x43, 0xe8, // Key=2 (MaxRequestId), Value=1000
            ]
        );

        let decoded = ServerSetup::decode(&mut buf).unwrap();
        assert_eq!(decoded.selected_version, server.selected_version);
        assert_eq!(decoded.setup_parameters, server.setup_parameters);
    }
}
