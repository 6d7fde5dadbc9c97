// Copyright (c) 2024 The Spacemesh Foundation

//! APDU framing over fixed-size HID reports
//!
//! APDUs of arbitrary length are segmented into 64-byte reports and
//! reassembled from the device's response stream. Every report carries the
//! session channel, the APDU tag and a per-message sequence number:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |            CHANNEL            |      TAG      |    SEQUENCE   :
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! :               |      [LENGTH, sequence 0 only]    |   DATA ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Channel, sequence and length are big-endian. The first report of a
//! message carries the 2-byte total APDU length, leaving 57 payload bytes;
//! subsequent reports carry 59. Outbound writes are prefixed with a zero
//! report-ID byte for the OS HID layer; inbound reports carry none.

use log::trace;

use crate::Error;

/// HID report size in bytes
pub const PACKET_SIZE: usize = 64;

/// Tag byte identifying a generic APDU-over-HID message
pub const APDU_TAG: u8 = 0x05;

/// Upper bound on a declared response length, responses claiming more are
/// rejected before allocation
pub const MAX_RESPONSE_LEN: usize = 2048;

// Header bytes on the first report (channel + tag + sequence + length) and
// on every subsequent report (channel + tag + sequence)
const FIRST_HEADER_LEN: usize = 7;
const CONT_HEADER_LEN: usize = 5;

/// Report-level transfer, implemented by HID backends.
///
/// A report is [`PACKET_SIZE`] bytes; writes carry a leading report-ID
/// byte on top of that.
pub trait ReportIo {
    /// Deliver one report, returning the number of bytes accepted
    fn write_report(&mut self, report: &[u8]) -> Result<usize, Error>;

    /// Receive one report. Backends map an empty read to
    /// [`Error::Timeout`] when a read timeout is configured and
    /// [`Error::ReadEmpty`] otherwise.
    fn read_report(&mut self) -> Result<Vec<u8>, Error>;
}

/// Segment a request APDU into reports on the given channel and write them
/// in sequence order
pub fn write_apdu<T: ReportIo + ?Sized>(
    io: &mut T,
    channel: u16,
    apdu: &[u8],
) -> Result<(), Error> {
    let mut report = [0u8; PACKET_SIZE + 1];
    let mut offset = 0;
    let mut sequence = 0u16;

    loop {
        report.fill(0);

        // Report-ID byte for the OS HID layer, then the frame header
        report[1..3].copy_from_slice(&channel.to_be_bytes());
        report[3] = APDU_TAG;
        report[4..6].copy_from_slice(&sequence.to_be_bytes());

        let (data_offset, capacity) = match sequence {
            0 => {
                report[6..8].copy_from_slice(&(apdu.len() as u16).to_be_bytes());
                (1 + FIRST_HEADER_LEN, PACKET_SIZE - FIRST_HEADER_LEN)
            }
            _ => (1 + CONT_HEADER_LEN, PACKET_SIZE - CONT_HEADER_LEN),
        };

        let chunk = capacity.min(apdu.len() - offset);
        report[data_offset..data_offset + chunk].copy_from_slice(&apdu[offset..offset + chunk]);
        offset += chunk;

        trace!("> report seq {} ({} payload bytes)", sequence, chunk);

        // Backends may report the write with or without the report-ID byte
        let n = io.write_report(&report)?;
        if n != PACKET_SIZE && n != PACKET_SIZE + 1 {
            return Err(Error::WriteShort(n));
        }

        if offset == apdu.len() {
            return Ok(());
        }
        sequence += 1;
    }
}

/// Reassemble a response APDU from reports on the given channel.
///
/// Each report is validated against the session channel, the APDU tag and
/// the expected sequence number; the total length declared by report 0
/// bounds the exchange.
pub fn read_apdu<T: ReportIo + ?Sized>(io: &mut T, channel: u16) -> Result<Vec<u8>, Error> {
    let mut data = Vec::new();
    let mut total = 0;
    let mut sequence = 0u16;

    loop {
        let report = io.read_report()?;

        let header_len = match sequence {
            0 => FIRST_HEADER_LEN,
            _ => CONT_HEADER_LEN,
        };
        if report.len() < header_len {
            return Err(Error::ReadEmpty);
        }

        if report[0..2] != channel.to_be_bytes() {
            return Err(Error::InvalidChannel);
        }
        if report[2] != APDU_TAG {
            return Err(Error::InvalidTag);
        }
        if report[3..5] != sequence.to_be_bytes() {
            return Err(Error::InvalidSequence);
        }

        if sequence == 0 {
            total = u16::from_be_bytes([report[5], report[6]]) as usize;
            if total > MAX_RESPONSE_LEN {
                return Err(Error::ResponseTooLong(total));
            }
            data.reserve_exact(total);
        }

        data.extend_from_slice(&report[header_len..]);

        trace!("< report seq {} ({} of {} bytes)", sequence, data.len().min(total), total);

        if data.len() >= total {
            data.truncate(total);
            return Ok(data);
        }
        sequence += 1;
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;

    use super::*;

    /// Scripted report-level loopback
    struct TestIo {
        written: Vec<Vec<u8>>,
        reads: VecDeque<Vec<u8>>,
        write_len: Option<usize>,
    }

    impl TestIo {
        fn new() -> Self {
            Self {
                written: vec![],
                reads: VecDeque::new(),
                write_len: None,
            }
        }

        fn with_reads(reads: Vec<Vec<u8>>) -> Self {
            Self {
                reads: reads.into(),
                ..Self::new()
            }
        }
    }

    impl ReportIo for TestIo {
        fn write_report(&mut self, report: &[u8]) -> Result<usize, Error> {
            self.written.push(report.to_vec());
            Ok(self.write_len.unwrap_or(report.len()))
        }

        fn read_report(&mut self) -> Result<Vec<u8>, Error> {
            self.reads.pop_front().ok_or(Error::ReadEmpty)
        }
    }

    /// Build the report stream a device would produce for a response
    fn device_reports(channel: u16, data: &[u8]) -> Vec<Vec<u8>> {
        let mut reports = vec![];
        let mut offset = 0;
        let mut sequence = 0u16;

        loop {
            let mut report = vec![0u8; PACKET_SIZE];
            report[0..2].copy_from_slice(&channel.to_be_bytes());
            report[2] = APDU_TAG;
            report[3..5].copy_from_slice(&sequence.to_be_bytes());

            let (data_offset, capacity) = match sequence {
                0 => {
                    report[5..7].copy_from_slice(&(data.len() as u16).to_be_bytes());
                    (7, PACKET_SIZE - 7)
                }
                _ => (5, PACKET_SIZE - 5),
            };

            let chunk = capacity.min(data.len() - offset);
            report[data_offset..data_offset + chunk]
                .copy_from_slice(&data[offset..offset + chunk]);
            offset += chunk;

            reports.push(report);

            if offset == data.len() {
                return reports;
            }
            sequence += 1;
        }
    }

    #[test]
    fn write_report_layout() {
        let mut io = TestIo::new();
        let apdu: Vec<u8> = (0..100u8).collect();

        write_apdu(&mut io, 0x1234, &apdu).unwrap();

        assert_eq!(io.written.len(), 2);

        // First report: report-ID, channel, tag, sequence 0, total length
        let r = &io.written[0];
        assert_eq!(r.len(), PACKET_SIZE + 1);
        assert_eq!(&r[..8], &[0x00, 0x12, 0x34, 0x05, 0x00, 0x00, 0x00, 100]);
        assert_eq!(&r[8..], &apdu[..57]);

        // Continuation: no length field, next sequence
        let r = &io.written[1];
        assert_eq!(&r[..6], &[0x00, 0x12, 0x34, 0x05, 0x00, 0x01]);
        assert_eq!(&r[6..6 + 43], &apdu[57..]);
        assert!(r[6 + 43..].iter().all(|b| *b == 0));
    }

    #[test]
    fn write_report_counts() {
        for (len, reports) in [(0, 1), (1, 1), (57, 1), (58, 2), (116, 2), (117, 3), (260, 5)] {
            let mut io = TestIo::new();
            write_apdu(&mut io, 0x0101, &vec![0xaa; len]).unwrap();
            assert_eq!(io.written.len(), reports, "APDU length {len}");

            // Sequence numbers run 0, 1, 2, ... with no gaps
            for (i, r) in io.written.iter().enumerate() {
                assert_eq!(u16::from_be_bytes([r[4], r[5]]), i as u16);
            }
        }
    }

    #[test]
    fn write_short_rejected() {
        let mut io = TestIo::new();
        io.write_len = Some(12);

        let err = write_apdu(&mut io, 0x0101, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::WriteShort(12)));
    }

    #[test]
    fn write_accepts_either_report_length() {
        for n in [PACKET_SIZE, PACKET_SIZE + 1] {
            let mut io = TestIo::new();
            io.write_len = Some(n);
            write_apdu(&mut io, 0x0101, &[0u8; 4]).unwrap();
        }
    }

    #[test]
    fn read_round_trip() {
        for len in [0usize, 1, 2, 56, 57, 58, 116, 117, 500, 2000] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();

            let mut io = TestIo::with_reads(device_reports(0xbeef, &data));
            let out = read_apdu(&mut io, 0xbeef).unwrap();

            assert_eq!(out, data, "response length {len}");
            assert!(io.reads.is_empty(), "unconsumed reports at length {len}");
        }
    }

    #[test]
    fn segment_reassemble_round_trip() {
        // Host-side segmentation feeds back through reassembly unchanged
        for len in [0usize, 1, 57, 58, 200, 2000] {
            let data: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();

            let mut io = TestIo::new();
            write_apdu(&mut io, 0x4242, &data).unwrap();

            // Strip the report-ID byte to replay the stream as reads
            let reads = io.written.iter().map(|r| r[1..].to_vec()).collect();
            let mut io = TestIo::with_reads(reads);

            assert_eq!(read_apdu(&mut io, 0x4242).unwrap(), data);
        }
    }

    #[test]
    fn read_rejects_wrong_channel() {
        let reports = device_reports(0x1111, &[0u8; 8]);
        let mut io = TestIo::with_reads(reports);

        let err = read_apdu(&mut io, 0x2222).unwrap_err();
        assert!(matches!(err, Error::InvalidChannel));
    }

    #[test]
    fn read_rejects_wrong_tag() {
        let mut reports = device_reports(0x1111, &[0u8; 8]);
        reports[0][2] = 0x06;
        let mut io = TestIo::with_reads(reports);

        let err = read_apdu(&mut io, 0x1111).unwrap_err();
        assert!(matches!(err, Error::InvalidTag));
    }

    #[test]
    fn read_rejects_sequence_gap() {
        let mut reports = device_reports(0x1111, &[0u8; 200]);
        // Drop the middle report, its successor arrives out of sequence
        reports.remove(1);
        let mut io = TestIo::with_reads(reports);

        let err = read_apdu(&mut io, 0x1111).unwrap_err();
        assert!(matches!(err, Error::InvalidSequence));
    }

    #[test]
    fn read_rejects_oversize_declared_length() {
        let mut report = vec![0u8; PACKET_SIZE];
        report[0..2].copy_from_slice(&0x1111u16.to_be_bytes());
        report[2] = APDU_TAG;
        report[5..7].copy_from_slice(&4000u16.to_be_bytes());
        let mut io = TestIo::with_reads(vec![report]);

        let err = read_apdu(&mut io, 0x1111).unwrap_err();
        assert!(matches!(err, Error::ResponseTooLong(4000)));
    }

    #[test]
    fn read_truncates_to_declared_length() {
        // A device pads the final report; reassembly must not keep padding
        let mut io = TestIo::with_reads(device_reports(0x1111, &[0xe5; 10]));
        let out = read_apdu(&mut io, 0x1111).unwrap();

        assert_eq!(out, vec![0xe5; 10]);
    }
}
