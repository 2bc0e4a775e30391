// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network + Transport Layer
//!
//! One blocking request/response round trip per call. The transport opens
//! a fresh connection, writes the request, half-closes, then reads the
//! full response before returning. There is no retry, timeout or
//! cancellation here: a hung server hangs the call, and the caller owns
//! any policy on top.

mod mock;
mod tcp;
mod transport;

pub use mock::MockTransport;
pub use tcp::TcpTransport;
pub use transport::{NetworkError, Transport, TransportConfig};
