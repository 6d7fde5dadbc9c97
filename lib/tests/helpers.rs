// Copyright (c) 2024 The Spacemesh Foundation

use std::collections::VecDeque;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::SimpleLogger;

use ledger_smesh::{apdu::status::SW_OK, Error, Exchange};

/// Setup logging from the LOG_LEVEL environment variable
#[allow(unused)]
pub fn setup() {
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let _ = SimpleLogger::init(log_level, simplelog::Config::default());
}

/// Scripted APDU transport standing in for a device.
///
/// Records every request APDU and answers from a queue of canned
/// responses (body plus status word).
pub struct MockTransport {
    /// Request APDUs in dispatch order
    pub requests: Vec<Vec<u8>>,
    responses: VecDeque<Vec<u8>>,
    closed: bool,
}

#[allow(unused)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            requests: vec![],
            responses: VecDeque::new(),
            closed: false,
        }
    }

    /// Queue a response with the given body and status word
    pub fn respond(mut self, body: &[u8], status: u16) -> Self {
        let mut resp = body.to_vec();
        resp.extend_from_slice(&status.to_be_bytes());
        self.responses.push_back(resp);
        self
    }

    /// Queue a successful response
    pub fn respond_ok(self, body: &[u8]) -> Self {
        self.respond(body, SW_OK)
    }

    /// Queue a raw response without appending a status word
    pub fn respond_raw(mut self, resp: &[u8]) -> Self {
        self.responses.push_back(resp.to_vec());
        self
    }
}

impl Exchange for MockTransport {
    fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>, Error> {
        if self.closed {
            return Err(Error::Closed);
        }

        self.requests.push(apdu.to_vec());

        match self.responses.pop_front() {
            Some(r) => Ok(r),
            None => panic!("unscripted exchange: {:02x?}", apdu),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
