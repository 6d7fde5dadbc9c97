// Copyright (c) 2024 The Spacemesh Foundation

//! Spacemesh Ledger API Library
//!
//! Talks to the Spacemesh app on Ledger hardware wallets: derivation-path
//! based key and address export plus transaction signing, over a layered
//! APDU-on-HID transport.
//!
//! ```no_run
//! use std::str::FromStr;
//!
//! use ledger_smesh::{apdu::path::BipPath, LedgerProvider};
//!
//! # fn main() -> Result<(), ledger_smesh::Error> {
//! let provider = LedgerProvider::new()?;
//!
//! let devices = provider.list_devices();
//! let mut device = provider.connect(&devices[0])?;
//!
//! let version = device.get_version()?;
//! println!("app version: {version}");
//!
//! let path = BipPath::from_str("44'/540'/0'/0/0'").unwrap();
//! let key = device.get_extended_public_key(&path)?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "transport_hid")]
use core::fmt::{self, Display};

#[cfg(feature = "transport_hid")]
use hidapi::{DeviceInfo, HidApi};
#[cfg(feature = "transport_hid")]
use log::debug;

/// Re-export `ledger-smesh-apdu` for consumers
pub use ledger_smesh_apdu as apdu;

mod error;
pub use error::Error;

pub mod frame;

mod handle;
pub use handle::DeviceHandle;

pub mod transport;
pub use transport::Exchange;

#[cfg(feature = "transport_hid")]
pub mod hid;
#[cfg(feature = "transport_hid")]
pub use hid::{TransportNativeHid, LEDGER_USAGE_PAGE, LEDGER_VID};

/// Ledger provider, manages the HID backend and device connections
#[cfg(feature = "transport_hid")]
pub struct LedgerProvider {
    hid_api: HidApi,
}

/// Ledger device information for listing, used by connect
#[cfg(feature = "transport_hid")]
#[derive(Clone, Debug)]
pub struct LedgerInfo {
    info: DeviceInfo,
}

#[cfg(feature = "transport_hid")]
impl LedgerProvider {
    /// Create a new ledger provider
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            hid_api: HidApi::new()?,
        })
    }

    /// List available ledger devices
    pub fn list_devices(&self) -> Vec<LedgerInfo> {
        let devices: Vec<_> = hid::list_ledgers(&self.hid_api)
            .cloned()
            .map(|info| LedgerInfo { info })
            .collect();

        debug!("Found {} devices: {:?}", devices.len(), devices);

        devices
    }

    /// Connect to the specified device, opening a session with a fresh
    /// channel
    pub fn connect(&self, info: &LedgerInfo) -> Result<DeviceHandle<TransportNativeHid>, Error> {
        let t = TransportNativeHid::open(&self.hid_api, &info.info)?;

        Ok(DeviceHandle::from(t))
    }
}

#[cfg(feature = "transport_hid")]
impl Display for LedgerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:16} (USB, {:04x}:{:04x}, {})",
            self.info.product_string().unwrap_or("UNKNOWN"),
            self.info.vendor_id(),
            self.info.product_id(),
            self.info.serial_number().unwrap_or("UNKNOWN"),
        )
    }
}
