// Copyright (c) 2024 The Spacemesh Foundation

//! Handle for connected Ledger devices
//!
//! This provides the Spacemesh app commands and is generic over
//! [`Exchange`] transports.

use encdec::{DecodeOwned, Encode};
use log::debug;

use ledger_smesh_apdu::{
    address::{Address, GetAddressReq, ShowAddressReq, ADDRESS_LEN},
    encode_request,
    path::BipPath,
    public_key::{ExtPubKeyReq, ExtendedPublicKey, EXT_PUB_KEY_LEN},
    status::StatusWord,
    tx::{SignFlags, SignTxChunk, SignTxResp, MAX_SIGN_CHUNK_LEN, SIGN_TX_RESP_LEN, TX_KIND_OFFSET},
    version::{Version, VersionReq, VERSION_LEN},
    ApduError, ApduReq, APDU_HEADER_LEN, MAX_APDU_DATA_LEN,
};

use crate::{transport::Exchange, Error};

/// Spacemesh session handle for a connected Ledger device.
///
/// This is generic over [`Exchange`] to support different underlying
/// transports. The handle owns its transport, so a session has exactly
/// one user at a time; [`DeviceHandle::close`] ends it.
pub struct DeviceHandle<T: Exchange> {
    t: T,
}

/// Create a [`DeviceHandle`] wrapper from a type implementing [`Exchange`]
impl<T: Exchange> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self { t }
    }
}

impl<T: Exchange> DeviceHandle<T> {
    /// Access the underlying transport, e.g. to configure timeouts
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.t
    }

    /// Close the session, releasing the transport
    pub fn close(mut self) {
        self.t.close();
    }

    /// Fetch the application version
    pub fn get_version(&mut self) -> Result<Version, Error> {
        debug!("Requesting app version");

        let body = self.request(&VersionReq::default())?;
        decode_body::<Version>(&body, VERSION_LEN)
    }

    /// Fetch the public key and chain code for the provided derivation path
    pub fn get_extended_public_key(&mut self, path: &BipPath) -> Result<ExtendedPublicKey, Error> {
        debug!("Requesting extended public key for m/{path}");

        let body = self.request(&ExtPubKeyReq::new(path))?;
        decode_body::<ExtendedPublicKey>(&body, EXT_PUB_KEY_LEN)
    }

    /// Fetch the wallet address for the provided derivation path
    pub fn get_address(&mut self, path: &BipPath) -> Result<Address, Error> {
        debug!("Requesting address for m/{path}");

        let body = self.request(&GetAddressReq::new(path))?;
        decode_body::<Address>(&body, ADDRESS_LEN)
    }

    /// Show the wallet address for the provided derivation path on the
    /// device screen and wait for on-device confirmation
    pub fn show_address(&mut self, path: &BipPath) -> Result<(), Error> {
        debug!("Displaying address for m/{path}");

        let body = self.request(&ShowAddressReq::new(path))?;
        expect_empty(&body)
    }

    /// Sign a serialized transaction with the key at the provided
    /// derivation path.
    ///
    /// Payloads beyond a single APDU are chunked with role flags: the
    /// first chunk carries the transaction header, the final chunk returns
    /// the signature. Returns a 97-byte buffer of the transaction type
    /// byte (`tx[32]`) followed by the 64-byte signature and the 32-byte
    /// signer public key.
    pub fn sign_tx(&mut self, path: &BipPath, tx: &[u8]) -> Result<Vec<u8>, Error> {
        // The type byte heads the returned buffer, reject transactions
        // too short to carry one
        let kind = *tx
            .get(TX_KIND_OFFSET)
            .ok_or(Error::UnexpectedLength {
                expected: TX_KIND_OFFSET + 1,
                actual: tx.len(),
            })?;

        let mut payload = vec![0u8; path.encode_len()?];
        path.encode(&mut payload)?;
        payload.extend_from_slice(tx);

        debug!("Signing {} byte payload", payload.len());

        let body = if payload.len() <= MAX_SIGN_CHUNK_LEN {
            self.sign_chunk(SignFlags::HAS_HEADER | SignFlags::IS_LAST, &payload)?
        } else {
            // Transaction header plus the first slice of data
            let (first, mut rest) = payload.split_at(MAX_SIGN_CHUNK_LEN);
            let body = self.sign_chunk(SignFlags::HAS_HEADER | SignFlags::HAS_DATA, first)?;
            expect_empty(&body)?;

            // Intermediate data chunks
            while rest.len() > MAX_SIGN_CHUNK_LEN {
                let (chunk, r) = rest.split_at(MAX_SIGN_CHUNK_LEN);
                let body = self.sign_chunk(SignFlags::HAS_DATA, chunk)?;
                expect_empty(&body)?;
                rest = r;
            }

            // Final chunk returns the signature
            self.sign_chunk(SignFlags::IS_LAST, rest)?
        };

        let resp = decode_body::<SignTxResp>(&body, SIGN_TX_RESP_LEN)?;

        let mut signed = Vec::with_capacity(1 + SIGN_TX_RESP_LEN);
        signed.push(kind);
        signed.extend_from_slice(&resp.signature);
        signed.extend_from_slice(&resp.public_key);

        Ok(signed)
    }

    /// Issue one signing chunk
    fn sign_chunk(&mut self, flags: SignFlags, data: &[u8]) -> Result<Vec<u8>, Error> {
        debug!("Sign chunk: {} bytes, flags {:?}", data.len(), flags);

        self.request(&SignTxChunk::new(flags, data))
    }

    /// Serialize and dispatch a request APDU, strip and classify the
    /// response status word, and return the response body
    fn request(&mut self, req: &impl ApduReq) -> Result<Vec<u8>, Error> {
        let mut buff = [0u8; APDU_HEADER_LEN + MAX_APDU_DATA_LEN];
        let n = encode_request(req, &mut buff)?;

        let mut resp = self.t.exchange(&buff[..n])?;

        if resp.len() < 2 {
            return Err(Error::ShortResponse);
        }

        let sw = resp.split_off(resp.len() - 2);
        let status = StatusWord::from(u16::from_be_bytes([sw[0], sw[1]]));
        if !status.is_ok() {
            debug!("Device returned status {status}");
            return Err(Error::Status(status));
        }

        Ok(resp)
    }
}

/// Decode a response body after checking it has exactly the expected length
fn decode_body<R>(body: &[u8], expected: usize) -> Result<R, Error>
where
    R: DecodeOwned<Output = R, Error = ApduError>,
{
    if body.len() != expected {
        return Err(Error::UnexpectedLength {
            expected,
            actual: body.len(),
        });
    }

    let (resp, _) = R::decode_owned(body)?;
    Ok(resp)
}

/// Check a response body is empty where the command returns nothing
fn expect_empty(body: &[u8]) -> Result<(), Error> {
    match body.len() {
        0 => Ok(()),
        n => Err(Error::UnexpectedLength {
            expected: 0,
            actual: n,
        }),
    }
}
