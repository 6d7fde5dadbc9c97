// Copyright (c) 2024 The Spacemesh Foundation

//! Common protocol types, re-exported for consumer convenience

pub use crate::address::{Address, GetAddressReq, ShowAddressReq, ADDRESS_LEN};
pub use crate::path::BipPath;
pub use crate::public_key::{ExtPubKeyReq, ExtendedPublicKey, EXT_PUB_KEY_LEN};
pub use crate::status::StatusWord;
pub use crate::tx::{
    SignFlags, SignTxChunk, SignTxResp, Transaction, TxType, MAX_SIGN_CHUNK_LEN, SIGN_TX_RESP_LEN,
    TX_KIND_OFFSET,
};
pub use crate::version::{Version, VersionReq, VERSION_LEN};
pub use crate::{encode_request, ApduError, ApduHeader, ApduReq, ApduStatic, Instruction};
