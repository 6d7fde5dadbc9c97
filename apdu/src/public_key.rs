// Copyright (c) 2024 The Spacemesh Foundation

//! Extended public key APDUs

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, SMESH_APDU_CLA};
use crate::path::BipPath;

/// Extended public key request APDU.
///
/// Requests the public key and chain code for a BIP32 derivation path,
/// payload is the wire-encoded path.
#[derive(Clone, PartialEq, Debug)]
pub struct ExtPubKeyReq<'a> {
    /// Derivation path for the requested key
    pub path: &'a BipPath,
}

impl<'a> ExtPubKeyReq<'a> {
    /// Create a new [`ExtPubKeyReq`] APDU
    pub fn new(path: &'a BipPath) -> Self {
        Self { path }
    }
}

impl ApduStatic for ExtPubKeyReq<'_> {
    const CLA: u8 = SMESH_APDU_CLA;
    const INS: u8 = Instruction::GetExtPublicKey as u8;
}

impl Encode for ExtPubKeyReq<'_> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        self.path.encode(buff)
    }
}

/// Extended public key response
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          PUBLIC_KEY                           /
/// /                      (32-byte ED25519 key)                    /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          CHAIN_CODE                           /
/// /                          (32 bytes)                           /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ExtendedPublicKey {
    /// Raw ED25519 public key
    pub public_key: [u8; 32],
    /// BIP32 chain code
    pub chain_code: [u8; 32],
}

/// Encoded length of an [`ExtendedPublicKey`] response
pub const EXT_PUB_KEY_LEN: usize = 64;

impl Encode for ExtendedPublicKey {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(EXT_PUB_KEY_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < EXT_PUB_KEY_LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..32].copy_from_slice(&self.public_key);
        buff[32..64].copy_from_slice(&self.chain_code);

        Ok(EXT_PUB_KEY_LEN)
    }
}

impl DecodeOwned for ExtendedPublicKey {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < EXT_PUB_KEY_LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&buff[..32]);

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&buff[32..64]);

        Ok((
            Self {
                public_key,
                chain_code,
            },
            EXT_PUB_KEY_LEN,
        ))
    }
}
