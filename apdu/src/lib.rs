// Copyright (c) 2024 The Spacemesh Foundation

//! Protocol / APDU definitions for Spacemesh Ledger app communication
//!
//! This crate provides typed request and response APDUs for the commands
//! exposed by the Spacemesh nanoapp, together with the BIP32 derivation-path
//! codec, the transaction byte layout, and the status-word classification.
//!
//! Requests implement [`encdec::Encode`] and carry their `CLA/INS/P1/P2`
//! header via [`ApduStatic`]; responses implement [`encdec::DecodeOwned`].
//! All multi-byte integers on the wire are big-endian.

use encdec::Encode;

pub mod address;
pub mod path;
pub mod prelude;
pub mod public_key;
pub mod status;
pub mod tx;
pub mod version;

/// Spacemesh APDU class
pub const SMESH_APDU_CLA: u8 = 0x30;

/// Unused P1 value
pub const P1_UNUSED: u8 = 0x00;

/// Unused P2 value
pub const P2_UNUSED: u8 = 0x00;

/// Length of the `CLA | INS | P1 | P2 | Lc` request header
pub const APDU_HEADER_LEN: usize = 5;

/// Maximum APDU data length, `Lc` must fit a single byte
pub const MAX_APDU_DATA_LEN: usize = 255;

/// Spacemesh APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version
    GetVersion = 0x00,

    /// Fetch extended public key for a derivation path
    GetExtPublicKey = 0x10,

    /// Fetch (or display) the address for a derivation path
    GetAddress = 0x11,

    /// Sign a transaction, chunked for larger payloads
    SignTx = 0x20,
}

/// APDU protocol error type
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ApduError {
    /// Buffer too small for the encoded object
    #[error("invalid encode/decode buffer length")]
    InvalidLength,

    /// Field could not be decoded
    #[error("invalid field encoding")]
    InvalidEncoding,

    /// Payload does not fit the single-byte APDU length field
    #[error("APDU data length {0} exceeds 255 byte limit")]
    DataLengthTooBig(usize),

    /// Derivation path without components where one is required
    #[error("empty derivation path")]
    EmptyPath,

    /// Derivation path component could not be parsed
    #[error("bad derivation path component `{0}`")]
    BadPathComponent(String),
}

impl From<encdec::Error> for ApduError {
    fn from(err: encdec::Error) -> Self {
        match err {
            encdec::Error::Length => ApduError::InvalidLength,
            encdec::Error::Utf8 => ApduError::InvalidEncoding,
        }
    }
}

/// APDU request header
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ApduHeader {
    /// Class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// First parameter
    pub p1: u8,
    /// Second parameter
    pub p2: u8,
}

/// Static APDU header information, implemented by request objects with
/// fixed class and instruction bytes
pub trait ApduStatic {
    /// APDU class
    const CLA: u8;

    /// APDU instruction
    const INS: u8;

    /// First parameter, unused by default
    fn p1(&self) -> u8 {
        P1_UNUSED
    }

    /// Second parameter, unused by default
    fn p2(&self) -> u8 {
        P2_UNUSED
    }
}

/// APDU request trait, encodable with a request header
pub trait ApduReq: Encode<Error = ApduError> {
    /// Fetch the [`ApduHeader`] for this request
    fn header(&self) -> ApduHeader;
}

/// [`ApduReq`] is provided for all [`ApduStatic`] encodable types
impl<T: ApduStatic + Encode<Error = ApduError>> ApduReq for T {
    fn header(&self) -> ApduHeader {
        ApduHeader {
            cla: T::CLA,
            ins: T::INS,
            p1: self.p1(),
            p2: self.p2(),
        }
    }
}

/// Serialize a request APDU (header, `Lc`, data) into the provided buffer,
/// returning the number of bytes written.
///
/// Data lengths that do not fit the single-byte `Lc` field are rejected
/// with [`ApduError::DataLengthTooBig`] before anything reaches the wire.
pub fn encode_request(req: &impl ApduReq, buff: &mut [u8]) -> Result<usize, ApduError> {
    let data_len = req.encode_len()?;
    if data_len > MAX_APDU_DATA_LEN {
        return Err(ApduError::DataLengthTooBig(data_len));
    }
    if buff.len() < APDU_HEADER_LEN + data_len {
        return Err(ApduError::InvalidLength);
    }

    let h = req.header();
    buff[0] = h.cla;
    buff[1] = h.ins;
    buff[2] = h.p1;
    buff[3] = h.p2;
    buff[4] = data_len as u8;

    let n = req.encode(&mut buff[APDU_HEADER_LEN..])?;
    debug_assert_eq!(n, data_len);

    Ok(APDU_HEADER_LEN + n)
}

#[cfg(test)]
pub(crate) mod test {
    use core::fmt::Debug;

    use encdec::DecodeOwned;

    use super::*;

    /// Helper for request APDU encode tests, returns the full serialized
    /// request for comparison against expected bytes
    pub fn encode_request_apdu<'a>(buff: &'a mut [u8], req: &impl ApduReq) -> &'a [u8] {
        let n = encode_request(req, buff).expect("encode failed");

        // Check encoded data length matches the Lc field
        assert_eq!(n - APDU_HEADER_LEN, buff[4] as usize, "Lc mismatch");

        &buff[..n]
    }

    /// Helper for response APDU encode / decode tests
    pub fn encode_decode_apdu<A>(buff: &mut [u8], apdu: &A)
    where
        A: Encode<Error = ApduError> + DecodeOwned<Output = A, Error = ApduError> + PartialEq + Debug,
    {
        let n = apdu.encode(buff).expect("encode failed");

        let expected_n = apdu.encode_len().expect("get length failed");
        assert_eq!(n, expected_n, "encode length mismatch");

        let (decoded, decoded_n) = A::decode_owned(&buff[..n]).expect("decode failed");
        assert_eq!(apdu, &decoded);
        assert_eq!(n, decoded_n);
    }

    #[test]
    fn request_data_length_limit() {
        use crate::tx::{SignFlags, SignTxChunk};

        let data = [0xab; 256];
        let req = SignTxChunk::new(SignFlags::HAS_DATA, &data);

        let mut buff = [0u8; 512];
        let err = encode_request(&req, &mut buff).unwrap_err();
        assert_eq!(err, ApduError::DataLengthTooBig(256));
    }
}
