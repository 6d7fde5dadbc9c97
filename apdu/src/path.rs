// Copyright (c) 2024 The Spacemesh Foundation

//! BIP32 derivation path parsing and wire encoding
//!
//! Paths are sequences of 32-bit indices. A textual component with a
//! trailing `'` is hardened, setting the high bit of the parsed value.
//!
//! ## Wire encoding:
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     COUNT     |                COMPONENT_0 ...                |
//! +-+-+-+-+-+-+-+-+                                +-+-+-+-+-+-+-+-+
//! |               |                ...                            /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//! One count byte followed by each component as a big-endian `u32`.

use core::fmt::{self, Display};
use core::str::FromStr;

use encdec::Encode;

use crate::ApduError;

/// Hardened component marker, set on indices parsed with a `'` suffix
pub const HARDENED: u32 = 0x8000_0000;

// Count must fit the single length byte and the encoded path must fit an
// APDU payload
const MAX_COMPONENTS: usize = 63;

/// BIP32 derivation path
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BipPath(Vec<u32>);

impl BipPath {
    /// Create a path from raw component values
    pub fn new(components: impl Into<Vec<u32>>) -> Self {
        Self(components.into())
    }

    /// Fetch the raw component values
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Number of components in the path
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u32]> for BipPath {
    fn from(components: &[u32]) -> Self {
        Self(components.to_vec())
    }
}

/// Parse a textual path (`44'/540'/0'/0/0'`). The empty string yields the
/// empty path; commands that require components reject it when encoding.
impl FromStr for BipPath {
    type Err = ApduError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }

        let mut components = Vec::new();
        for item in s.split('/') {
            let (digits, base) = match item.strip_suffix('\'') {
                Some(d) => (d, HARDENED),
                None => (item, 0),
            };

            let value = u32::from_str(digits)
                .ok()
                .filter(|v| v & HARDENED == 0)
                .ok_or_else(|| ApduError::BadPathComponent(item.to_string()))?;

            components.push(base | value);
        }

        Ok(Self(components))
    }
}

impl Display for BipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, "/")?;
            }
            match c & HARDENED {
                0 => write!(f, "{c}")?,
                _ => write!(f, "{}'", c & !HARDENED)?,
            }
        }
        Ok(())
    }
}

impl Encode for BipPath {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(1 + 4 * self.0.len())
    }

    /// Encode the path into the provided buffer, rejecting paths no
    /// command accepts
    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        if self.0.is_empty() {
            return Err(ApduError::EmptyPath);
        }
        if self.0.len() > MAX_COMPONENTS {
            return Err(ApduError::DataLengthTooBig(self.encode_len()?));
        }
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.0.len() as u8;
        for (i, c) in self.0.iter().enumerate() {
            buff[1 + i * 4..][..4].copy_from_slice(&c.to_be_bytes());
        }

        Ok(1 + 4 * self.0.len())
    }
}
