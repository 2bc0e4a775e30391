// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TCP Transport
//!
//! Real transport over a plain TCP stream. Each round trip is its own
//! connection: connect, send header + payload, shut down the write half
//! to signal end-of-request, then read the response header and drain the
//! declared payload length.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::debug;

use crate::wire::{ResponseHeader, RESPONSE_HEADER_SIZE};

use super::transport::{NetworkError, Transport, TransportConfig};

/// TCP transport for relay communication.
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        TcpTransport { config }
    }

    /// Convenience constructor from a `host:port` string.
    pub fn connect_to(server_addr: &str) -> Self {
        TcpTransport {
            config: TransportConfig {
                server_addr: server_addr.to_string(),
            },
        }
    }
}

impl Transport for TcpTransport {
    fn round_trip(&mut self, request: &[u8]) -> Result<(ResponseHeader, Vec<u8>), NetworkError> {
        debug!(
            server = %self.config.server_addr,
            request_len = request.len(),
            "opening round trip"
        );

        let mut stream = TcpStream::connect(&self.config.server_addr)
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        stream
            .write_all(request)
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;

        // No more data will be sent; the half-close tells the server the
        // request is complete.
        stream
            .shutdown(Shutdown::Write)
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;

        let mut header_bytes = [0u8; RESPONSE_HEADER_SIZE];
        stream
            .read_exact(&mut header_bytes)
            .map_err(|e| NetworkError::ReceiveFailed(e.to_string()))?;

        // from_bytes cannot fail on an exact-size buffer.
        let (header, _) = ResponseHeader::from_bytes(&header_bytes)
            .map_err(|e| NetworkError::ReceiveFailed(e.to_string()))?;

        let mut payload = vec![0u8; header.payload_size as usize];
        stream
            .read_exact(&mut payload)
            .map_err(|e| NetworkError::ReceiveFailed(e.to_string()))?;

        debug!(
            code = header.code,
            payload_len = payload.len(),
            "round trip complete"
        );

        Ok((header, payload))
    }
}
