// Copyright (c) 2024 The Spacemesh Foundation

//! APDU response status words
//!
//! Every response carries a trailing 2-byte big-endian status word. The
//! classification is total: any 16-bit code maps to exactly one variant.

use core::fmt::{self, Display};

/// Success status word
pub const SW_OK: u16 = 0x9000;

/// Classified APDU status word
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusWord {
    /// Command completed (`0x9000`)
    Ok,
    /// Spacemesh app is not launched on the device (`0x6E00`)
    AppNotLaunched,
    /// P1, P2 or payload is invalid (`0x6E05`)
    InvalidParameters,
    /// Request is not valid in the context of previous calls (`0x6E06`)
    InvalidState,
    /// Some part of the request data is invalid (`0x6E07`)
    InvalidData,
    /// User rejected the action on the device screen (`0x6E09`)
    UserRejected,
    /// Device is showing the PIN screen (`0x6E11`)
    PinLocked,
    /// Any other device status code
    Other(u16),
}

impl From<u16> for StatusWord {
    fn from(code: u16) -> Self {
        match code {
            SW_OK => StatusWord::Ok,
            0x6E00 => StatusWord::AppNotLaunched,
            0x6E05 => StatusWord::InvalidParameters,
            0x6E06 => StatusWord::InvalidState,
            0x6E07 => StatusWord::InvalidData,
            0x6E09 => StatusWord::UserRejected,
            0x6E11 => StatusWord::PinLocked,
            _ => StatusWord::Other(code),
        }
    }
}

impl StatusWord {
    /// Raw 16-bit status code
    pub fn code(&self) -> u16 {
        match self {
            StatusWord::Ok => SW_OK,
            StatusWord::AppNotLaunched => 0x6E00,
            StatusWord::InvalidParameters => 0x6E05,
            StatusWord::InvalidState => 0x6E06,
            StatusWord::InvalidData => 0x6E07,
            StatusWord::UserRejected => 0x6E09,
            StatusWord::PinLocked => 0x6E11,
            StatusWord::Other(code) => *code,
        }
    }

    /// Whether this is the success status
    pub fn is_ok(&self) -> bool {
        *self == StatusWord::Ok
    }
}

impl Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusWord::Ok => "ok",
            StatusWord::AppNotLaunched => "app is not launched",
            StatusWord::InvalidParameters => "P1, P2 or payload is invalid",
            StatusWord::InvalidState => "request is not valid in the context of previous calls",
            StatusWord::InvalidData => "some part of request data is invalid",
            StatusWord::UserRejected => "user rejected the action",
            StatusWord::PinLocked => "pin screen",
            StatusWord::Other(_) => "unknown status",
        };
        write!(f, "0x{:04X}: {}", self.code(), text)
    }
}
