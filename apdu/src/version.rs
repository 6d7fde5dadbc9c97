// Copyright (c) 2024 The Spacemesh Foundation

//! Application version APDUs

use core::fmt::{self, Display};

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, SMESH_APDU_CLA};

/// Fetch application version APDU, no payload
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct VersionReq {}

impl ApduStatic for VersionReq {
    const CLA: u8 = SMESH_APDU_CLA;
    const INS: u8 = Instruction::GetVersion as u8;
}

impl Encode for VersionReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

/// Application version response
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MAJOR     |     MINOR     |     PATCH     |     FLAGS     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Patch version
    pub patch: u8,
    /// Application flags
    pub flags: u8,
}

/// Encoded length of a [`Version`] response
pub const VERSION_LEN: usize = 4;

impl Encode for Version {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(VERSION_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < VERSION_LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..VERSION_LEN].copy_from_slice(&[self.major, self.minor, self.patch, self.flags]);

        Ok(VERSION_LEN)
    }
}

impl DecodeOwned for Version {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < VERSION_LEN {
            return Err(ApduError::InvalidLength);
        }

        Ok((
            Self {
                major: buff[0],
                minor: buff[1],
                patch: buff[2],
                flags: buff[3],
            },
            VERSION_LEN,
        ))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{encode_decode_apdu, encode_request_apdu};

    #[test]
    fn version_req_apdu() {
        let mut buff = [0u8; 16];
        let encoded = encode_request_apdu(&mut buff, &VersionReq::default());

        assert_eq!(encoded, &[0x30, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn version_resp_apdu() {
        let apdu = Version {
            major: 1,
            minor: 2,
            patch: 3,
            flags: 4,
        };

        let mut buff = [0u8; 16];
        encode_decode_apdu(&mut buff, &apdu);
    }
}
