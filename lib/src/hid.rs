// Copyright (c) 2024 The Spacemesh Foundation

//! Native USB HID transport for Ledger devices

use std::time::Duration;

use hidapi::{DeviceInfo, HidApi, HidDevice};
use log::debug;
use rand_core::{OsRng, RngCore};

use crate::frame::{self, ReportIo, PACKET_SIZE};
use crate::transport::Exchange;
use crate::Error;

/// Ledger USB vendor id
pub const LEDGER_VID: u16 = 0x2c97;

/// Usage page of the APDU interface on multi-interface firmware
pub const LEDGER_USAGE_PAGE: u16 = 0xFFA0;

/// Filter HID interfaces down to Ledger APDU endpoints
pub fn is_ledger(info: &DeviceInfo) -> bool {
    info.vendor_id() == LEDGER_VID && info.usage_page() == LEDGER_USAGE_PAGE
}

/// List Ledger APDU interfaces known to the HID backend
pub fn list_ledgers(api: &HidApi) -> impl Iterator<Item = &DeviceInfo> {
    api.device_list().filter(|i| is_ledger(i))
}

/// Native HID transport for a connected Ledger device.
///
/// Owns the open device handle and the session channel: 16 random bits
/// drawn at creation, fixed for the session lifetime, distinguishing this
/// host's reports from other processes sharing the device.
pub struct TransportNativeHid {
    device: Option<HidDevice>,
    channel: u16,
    timeout: Option<Duration>,
}

impl TransportNativeHid {
    /// Open the device described by `info` and allocate a session channel
    pub fn open(api: &HidApi, info: &DeviceInfo) -> Result<Self, Error> {
        let device = info.open_device(api)?;

        Ok(Self::from_device(device))
    }

    /// Wrap an already-open HID device
    pub fn from_device(device: HidDevice) -> Self {
        let channel = OsRng.next_u32() as u16;

        debug!("HID session on channel 0x{channel:04x}");

        Self {
            device: Some(device),
            channel,
            timeout: None,
        }
    }

    /// Set (or clear) the blocking-read timeout. On expiry the in-flight
    /// exchange fails with [`Error::Timeout`] and the session remains
    /// usable for the next command.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn device(&self) -> Result<&HidDevice, Error> {
        self.device.as_ref().ok_or(Error::Closed)
    }
}

impl ReportIo for TransportNativeHid {
    fn write_report(&mut self, report: &[u8]) -> Result<usize, Error> {
        let n = self.device()?.write(report)?;
        Ok(n)
    }

    fn read_report(&mut self) -> Result<Vec<u8>, Error> {
        let mut buff = [0u8; PACKET_SIZE];

        let n = match self.timeout {
            Some(t) => self
                .device()?
                .read_timeout(&mut buff, t.as_millis() as i32)?,
            None => self.device()?.read(&mut buff)?,
        };

        if n == 0 {
            return Err(match self.timeout {
                Some(_) => Error::Timeout,
                None => Error::ReadEmpty,
            });
        }

        Ok(buff[..n].to_vec())
    }
}

impl Exchange for TransportNativeHid {
    fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>, Error> {
        let channel = self.channel;

        frame::write_apdu(self, channel, apdu)?;
        frame::read_apdu(self, channel)
    }

    fn close(&mut self) {
        self.device = None;
    }
}
