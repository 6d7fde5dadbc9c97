// Copyright (c) 2024 The Spacemesh Foundation

//! Wallet address APDUs
//!
//! The `GetAddress` instruction serves two operations selected by P1:
//! returning the address to the host, or displaying it on the device
//! screen for user verification.

use core::fmt::{self, Display};

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, SMESH_APDU_CLA};
use crate::path::BipPath;

/// P1 value requesting the address be returned to the host
pub const P1_RETURN: u8 = 0x01;

/// P1 value requesting the address be shown on the device screen
pub const P1_DISPLAY: u8 = 0x02;

/// Address request APDU, returns the 20-byte address for a derivation path
#[derive(Clone, PartialEq, Debug)]
pub struct GetAddressReq<'a> {
    /// Derivation path for the requested address
    pub path: &'a BipPath,
}

impl<'a> GetAddressReq<'a> {
    /// Create a new [`GetAddressReq`] APDU
    pub fn new(path: &'a BipPath) -> Self {
        Self { path }
    }
}

impl ApduStatic for GetAddressReq<'_> {
    const CLA: u8 = SMESH_APDU_CLA;
    const INS: u8 = Instruction::GetAddress as u8;

    fn p1(&self) -> u8 {
        P1_RETURN
    }
}

impl Encode for GetAddressReq<'_> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        self.path.encode(buff)
    }
}

/// Address display request APDU, shows the address on the device screen
/// and returns an empty body once the user confirms
#[derive(Clone, PartialEq, Debug)]
pub struct ShowAddressReq<'a> {
    /// Derivation path for the displayed address
    pub path: &'a BipPath,
}

impl<'a> ShowAddressReq<'a> {
    /// Create a new [`ShowAddressReq`] APDU
    pub fn new(path: &'a BipPath) -> Self {
        Self { path }
    }
}

impl ApduStatic for ShowAddressReq<'_> {
    const CLA: u8 = SMESH_APDU_CLA;
    const INS: u8 = Instruction::GetAddress as u8;

    fn p1(&self) -> u8 {
        P1_DISPLAY
    }
}

impl Encode for ShowAddressReq<'_> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        self.path.encode(buff)
    }
}

/// Wallet address, 20 bytes
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Address(pub [u8; 20]);

/// Encoded length of an [`Address`] response
pub const ADDRESS_LEN: usize = 20;

impl Address {
    /// Fetch the raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Encode for Address {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(ADDRESS_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < ADDRESS_LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..ADDRESS_LEN].copy_from_slice(&self.0);

        Ok(ADDRESS_LEN)
    }
}

impl DecodeOwned for Address {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < ADDRESS_LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut a = [0u8; 20];
        a.copy_from_slice(&buff[..ADDRESS_LEN]);

        Ok((Self(a), ADDRESS_LEN))
    }
}

/// Debug format [`Address`] as hex
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Display [`Address`] as hex
impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
