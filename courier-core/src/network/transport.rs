// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Trait
//!
//! Platform-agnostic abstraction for the single blocking round trip every
//! protocol operation performs.

use thiserror::Error;

use crate::wire::ResponseHeader;

/// Transport-level errors.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration for transport connections.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Server address as `host:port`.
    pub server_addr: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            server_addr: "127.0.0.1:1357".to_string(),
        }
    }
}

/// Transport abstraction for one request/response exchange.
///
/// Implementations block until a complete response (header plus the
/// payload bytes it declares) has been received, or fail. The engine
/// never overlaps round trips.
pub trait Transport: Send {
    /// Sends an encoded request (header + payload) and returns the
    /// decoded response header together with exactly the payload bytes
    /// it declared.
    fn round_trip(&mut self, request: &[u8]) -> Result<(ResponseHeader, Vec<u8>), NetworkError>;
}
