// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! Records every request the engine produces and replays scripted
//! responses, in order. Used by the facade tests; exported so downstream
//! crates can test against the engine without a server.

use std::collections::VecDeque;

use crate::wire::{ResponseCode, ResponseHeader, PROTOCOL_VERSION};

use super::transport::{NetworkError, Transport};

/// Scripted in-memory transport.
#[derive(Default)]
pub struct MockTransport {
    requests: Vec<Vec<u8>>,
    responses: VecDeque<(ResponseHeader, Vec<u8>)>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Queues a success-path response with the given code and payload.
    pub fn push_response(&mut self, code: ResponseCode, payload: Vec<u8>) {
        self.push_raw_response(code as u16, payload);
    }

    /// Queues a response with an arbitrary raw code, e.g. to script a
    /// server rejection or a garbage code.
    pub fn push_raw_response(&mut self, code: u16, payload: Vec<u8>) {
        let header = ResponseHeader {
            version: PROTOCOL_VERSION,
            code,
            payload_size: payload.len() as u32,
        };
        self.responses.push_back((header, payload));
    }

    /// Queues a response whose declared payload length disagrees with the
    /// bytes delivered, to exercise protocol-violation handling.
    pub fn push_mismatched_response(&mut self, code: u16, declared: u32, payload: Vec<u8>) {
        let header = ResponseHeader {
            version: PROTOCOL_VERSION,
            code,
            payload_size: declared,
        };
        self.responses.push_back((header, payload));
    }

    /// All raw requests sent so far, oldest first.
    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<&[u8]> {
        self.requests.last().map(Vec::as_slice)
    }
}

impl Transport for MockTransport {
    fn round_trip(&mut self, request: &[u8]) -> Result<(ResponseHeader, Vec<u8>), NetworkError> {
        self.requests.push(request.to_vec());
        self.responses
            .pop_front()
            .ok_or_else(|| NetworkError::ReceiveFailed("no scripted response".to_string()))
    }
}
