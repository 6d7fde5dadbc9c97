// Copyright (c) 2024 The Spacemesh Foundation

use ledger_smesh_apdu::status::StatusWord;
use ledger_smesh_apdu::ApduError;

/// Spacemesh Ledger SDK error type
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Transport has been closed
    #[error("transport is closed")]
    Closed,

    /// HID report write returned an unexpected length
    #[error("short write to device ({0} bytes)")]
    WriteShort(usize),

    /// Transport read returned nothing with no timeout configured
    #[error("empty read from device")]
    ReadEmpty,

    /// Transport read timed out
    #[error("timeout waiting for device response")]
    Timeout,

    /// Response packet carried another session's channel
    #[error("invalid channel in response packet")]
    InvalidChannel,

    /// Response packet carried an unexpected tag byte
    #[error("invalid tag in response packet")]
    InvalidTag,

    /// Response packet arrived out of sequence
    #[error("invalid sequence in response packet")]
    InvalidSequence,

    /// Declared response length exceeds the read bound
    #[error("declared response length {0} exceeds limit")]
    ResponseTooLong(usize),

    /// Reassembled response too short to carry a status word
    #[error("response shorter than status word")]
    ShortResponse,

    /// Response body length does not match the command
    #[error("wrong response length: expected {expected}, got {actual}")]
    UnexpectedLength {
        /// Length required by the command
        expected: usize,
        /// Length actually returned
        actual: usize,
    },

    /// Device returned a non-OK status word
    #[error("request error {0}")]
    Status(StatusWord),

    /// APDU encode / decode failure
    #[error(transparent)]
    Apdu(#[from] ApduError),

    /// HID backend failure
    #[cfg(feature = "transport_hid")]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}
