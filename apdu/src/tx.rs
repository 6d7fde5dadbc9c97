// Copyright (c) 2024 The Spacemesh Foundation

//! Transaction signing APDUs and the transaction byte layout

use encdec::{DecodeOwned, Encode};
use num_enum::TryFromPrimitive;

use super::{ApduError, ApduStatic, Instruction, SMESH_APDU_CLA};

/// Maximum signing payload carried by a single APDU. Larger payloads are
/// split into chunks flagged via [`SignFlags`].
pub const MAX_SIGN_CHUNK_LEN: usize = 240;

/// Offset of the transaction type byte within the transaction layout
pub const TX_KIND_OFFSET: usize = 32;

/// Encoded length of a transaction without call data
pub const TX_BASE_LEN: usize = 117;

bitflags::bitflags! {
    /// Signing request flags, carried in P1.
    ///
    /// Exactly one chunk of a signing flow carries [`SignFlags::HAS_HEADER`]
    /// and exactly one carries [`SignFlags::IS_LAST`]; they coincide only
    /// when the whole payload fits a single APDU.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SignFlags: u8 {
        /// Chunk starts with the transaction header
        const HAS_HEADER = 0x01;

        /// More chunks follow this one
        const HAS_DATA = 0x02;

        /// Final chunk, the response carries the signature
        const IS_LAST = 0x04;
    }
}

/// Transaction type, the byte at [`TX_KIND_OFFSET`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive, strum::Display)]
#[repr(u8)]
pub enum TxType {
    /// Plain coin transfer
    #[strum(serialize = "COIN ED")]
    Coin = 0,

    /// Application call
    #[strum(serialize = "EXEC APP ED")]
    ExecApp = 2,

    /// Application spawn
    #[strum(serialize = "SPAWN APP ED")]
    SpawnApp = 4,
}

/// Spacemesh transaction, serialized for signing via [`Transaction::to_bytes`]
///
/// ## Encoding:
/// ```text
///  offset  field
///  0       NETWORK_ID   (32 bytes)
///  32      TYPE         (1 byte)
///  33      NONCE        (8-byte big-endian)
///  41      TO           (20-byte address)
///  61      GAS_LIMIT    (8-byte big-endian)
///  69      GAS_PRICE    (8-byte big-endian)
///  77      AMOUNT       (8-byte big-endian)
///  85      CALL_DATA    (variable, may be empty)
///  85+n    PUBLIC_KEY   (32-byte ED25519 signer key)
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct Transaction {
    /// Network identifier
    pub network_id: [u8; 32],
    /// Transaction type
    pub kind: TxType,
    /// Account nonce
    pub nonce: u64,
    /// Recipient, app or template address
    pub to: [u8; 20],
    /// Gas limit
    pub gas_limit: u64,
    /// Gas price
    pub gas_price: u64,
    /// Transferred amount
    pub amount: u64,
    /// Call data for app transactions, empty otherwise
    pub data: Vec<u8>,
    /// Signer public key
    pub public_key: [u8; 32],
}

impl Transaction {
    /// Serialize the transaction into the layout signed by the device
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut tx = Vec::with_capacity(TX_BASE_LEN + self.data.len());

        tx.extend_from_slice(&self.network_id);
        tx.push(self.kind as u8);
        tx.extend_from_slice(&self.nonce.to_be_bytes());
        tx.extend_from_slice(&self.to);
        tx.extend_from_slice(&self.gas_limit.to_be_bytes());
        tx.extend_from_slice(&self.gas_price.to_be_bytes());
        tx.extend_from_slice(&self.amount.to_be_bytes());
        tx.extend_from_slice(&self.data);
        tx.extend_from_slice(&self.public_key);

        tx
    }
}

/// Transaction signing request APDU, one chunk of the composed
/// `path || tx` payload with its role flags in P1
#[derive(Clone, PartialEq, Debug)]
pub struct SignTxChunk<'a> {
    /// Chunk role flags
    pub flags: SignFlags,
    /// Chunk payload bytes
    pub data: &'a [u8],
}

impl<'a> SignTxChunk<'a> {
    /// Create a new [`SignTxChunk`] APDU
    pub fn new(flags: SignFlags, data: &'a [u8]) -> Self {
        Self { flags, data }
    }
}

impl ApduStatic for SignTxChunk<'_> {
    const CLA: u8 = SMESH_APDU_CLA;
    const INS: u8 = Instruction::SignTx as u8;

    fn p1(&self) -> u8 {
        self.flags.bits()
    }
}

impl Encode for SignTxChunk<'_> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < self.data.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..self.data.len()].copy_from_slice(self.data);

        Ok(self.data.len())
    }
}

/// Transaction signature response, returned by the final signing chunk
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          SIGNATURE                            /
/// /                  (64-byte ED25519 signature)                  /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          PUBLIC_KEY                           /
/// /                   (32-byte ED25519 signer key)                /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignTxResp {
    /// Transaction signature
    pub signature: [u8; 64],
    /// Signer public key
    pub public_key: [u8; 32],
}

/// Encoded length of a [`SignTxResp`] response
pub const SIGN_TX_RESP_LEN: usize = 96;

impl Encode for SignTxResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(SIGN_TX_RESP_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if buff.len() < SIGN_TX_RESP_LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..64].copy_from_slice(&self.signature);
        buff[64..96].copy_from_slice(&self.public_key);

        Ok(SIGN_TX_RESP_LEN)
    }
}

impl DecodeOwned for SignTxResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < SIGN_TX_RESP_LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut signature = [0u8; 64];
        signature.copy_from_slice(&buff[..64]);

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&buff[64..96]);

        Ok((
            Self {
                signature,
                public_key,
            },
            SIGN_TX_RESP_LEN,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{encode_decode_apdu, encode_request_apdu};

    fn test_tx() -> Transaction {
        Transaction {
            network_id: [0u8; 32],
            kind: TxType::Coin,
            nonce: 1,
            to: [0x11; 20],
            gas_limit: 1_000_000,
            gas_price: 1_000,
            amount: 1_000_000_000_000,
            data: vec![],
            public_key: [0x22; 32],
        }
    }

    #[test]
    fn tx_layout() {
        let tx = test_tx().to_bytes();

        assert_eq!(tx.len(), TX_BASE_LEN);
        assert_eq!(tx[TX_KIND_OFFSET], TxType::Coin as u8);
        assert_eq!(tx[33..41], 1u64.to_be_bytes());
        assert_eq!(tx[41..61], [0x11; 20]);
        assert_eq!(tx[61..69], 1_000_000u64.to_be_bytes());
        assert_eq!(tx[69..77], 1_000u64.to_be_bytes());
        assert_eq!(tx[77..85], 1_000_000_000_000u64.to_be_bytes());
        assert_eq!(tx[85..117], [0x22; 32]);
    }

    #[test]
    fn tx_layout_with_call_data() {
        let mut tx = test_tx();
        tx.kind = TxType::ExecApp;
        tx.data = vec![0xcd; 40];

        let b = tx.to_bytes();
        assert_eq!(b.len(), TX_BASE_LEN + 40);
        assert_eq!(b[TX_KIND_OFFSET], 2);
        assert_eq!(b[85..125], [0xcd; 40]);
        assert_eq!(b[125..157], [0x22; 32]);
    }

    #[test]
    fn tx_type_from_kind_byte() {
        assert_eq!(TxType::try_from(0u8).unwrap(), TxType::Coin);
        assert_eq!(TxType::try_from(2u8).unwrap(), TxType::ExecApp);
        assert_eq!(TxType::try_from(4u8).unwrap(), TxType::SpawnApp);
        assert!(TxType::try_from(1u8).is_err());
    }

    #[test]
    fn sign_tx_chunk_apdu() {
        let data = [0xabu8; 16];
        let req = SignTxChunk::new(SignFlags::HAS_HEADER | SignFlags::IS_LAST, &data);

        let mut buff = [0u8; 64];
        let encoded = encode_request_apdu(&mut buff, &req);

        assert_eq!(&encoded[..5], &[0x30, 0x20, 0x05, 0x00, 0x10]);
        assert_eq!(&encoded[5..], &data[..]);
    }

    #[test]
    fn sign_tx_resp_apdu() {
        let apdu = SignTxResp {
            signature: [0x5a; 64],
            public_key: [0xa5; 32],
        };

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);
    }
}
