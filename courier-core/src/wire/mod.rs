// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wire Format
//!
//! Fixed binary layouts for the relay protocol. All multi-byte integers
//! are little-endian and structures are packed (no padding between
//! fields), so every field sits at an exact byte offset.

mod codec;

pub use codec::{
    decode_peer_entries, decode_waiting_records, encode_peer_entry, encode_registration_payload,
    encode_request, encode_send_payload, encode_waiting_record, WaitingRecord,
};

use thiserror::Error;

/// Length of a client id assigned by the server.
pub const CLIENT_ID_LEN: usize = 16;
/// Fixed width of the null-padded name field in registration payloads
/// and peer-list entries.
pub const MAX_NAME_LEN: usize = 255;
/// Fixed width of the public key blob on the wire.
pub const PUBLIC_KEY_LEN: usize = 160;

/// Wire protocol version byte.
pub const PROTOCOL_VERSION: u8 = 1;

/// Request header: client id (16) + version (1) + code (2) + payload length (4).
pub const REQUEST_HEADER_SIZE: usize = 23;
/// Response header: version (1) + code (2) + payload length (4).
pub const RESPONSE_HEADER_SIZE: usize = 7;
/// Registration payload: name field (255) + public key (160).
pub const REGISTRATION_PAYLOAD_SIZE: usize = MAX_NAME_LEN + PUBLIC_KEY_LEN;
/// Send-message payload header: destination id (16) + kind (1) + content length (4).
pub const SEND_PAYLOAD_HEADER_SIZE: usize = 21;
/// Waiting-message record header: sender id (16) + message id (4) + kind (1)
/// + content length (4).
pub const WAITING_RECORD_HEADER_SIZE: usize = 25;
/// Peer-list entry: client id (16) + null-padded name (255).
pub const PEER_ENTRY_SIZE: usize = CLIENT_ID_LEN + MAX_NAME_LEN;

/// A 16-byte opaque client id.
pub type ClientId = [u8; CLIENT_ID_LEN];

/// Wire-level decode errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("buffer too short for a header: needed {needed} bytes, got {got}")]
    MalformedHeader { needed: usize, got: usize },

    #[error("waiting-message batch truncated at offset {offset}: record declares {declared} content bytes, {remaining} remain")]
    TruncatedBatch {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("name does not fit the {MAX_NAME_LEN}-byte wire field")]
    NameTooLong,

    #[error("name field is not valid UTF-8")]
    InvalidName,
}

/// Request codes understood by the relay server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RequestCode {
    Register = 1000,
    ListPeers = 1001,
    FetchPublicKey = 1002,
    SendMessage = 1003,
    PollMessages = 1004,
}

impl RequestCode {
    /// The response code the server sends on success for this request.
    pub fn expected_response(self) -> ResponseCode {
        match self {
            RequestCode::Register => ResponseCode::RegisterOk,
            RequestCode::ListPeers => ResponseCode::PeerList,
            RequestCode::FetchPublicKey => ResponseCode::PublicKey,
            RequestCode::SendMessage => ResponseCode::MessageQueued,
            RequestCode::PollMessages => ResponseCode::WaitingMessages,
        }
    }

    /// Parses a raw request code. Used by test doubles that inspect
    /// requests the client produced.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(RequestCode::Register),
            1001 => Some(RequestCode::ListPeers),
            1002 => Some(RequestCode::FetchPublicKey),
            1003 => Some(RequestCode::SendMessage),
            1004 => Some(RequestCode::PollMessages),
            _ => None,
        }
    }
}

/// Response codes sent by the relay server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ResponseCode {
    RegisterOk = 2000,
    PeerList = 2001,
    PublicKey = 2002,
    MessageQueued = 2003,
    WaitingMessages = 2004,
    GeneralFailure = 9000,
}

/// Message kinds relayed between clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// Ask the peer to send us a session key. Empty content.
    KeyRequest = 1,
    /// A session key, asymmetrically encrypted for the recipient.
    KeySend = 2,
    /// Text, symmetrically encrypted with the shared session key.
    Text = 3,
    /// File bytes, symmetrically encrypted with the shared session key.
    File = 4,
}

impl MessageKind {
    /// Parses a raw kind byte. Returns `None` for kinds this client does
    /// not understand; the record can still be skipped via its declared
    /// content length.
    pub fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            1 => Some(MessageKind::KeyRequest),
            2 => Some(MessageKind::KeySend),
            3 => Some(MessageKind::Text),
            4 => Some(MessageKind::File),
            _ => None,
        }
    }
}

/// Header prefixed to every client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub client_id: ClientId,
    pub version: u8,
    pub code: u16,
    pub payload_size: u32,
}

impl RequestHeader {
    pub fn new(client_id: ClientId, code: RequestCode, payload_size: u32) -> Self {
        RequestHeader {
            client_id,
            version: PROTOCOL_VERSION,
            code: code as u16,
            payload_size,
        }
    }

    /// Serializes the header into its packed 23-byte layout.
    pub fn to_bytes(&self) -> [u8; REQUEST_HEADER_SIZE] {
        let mut out = [0u8; REQUEST_HEADER_SIZE];
        out[..16].copy_from_slice(&self.client_id);
        out[16] = self.version;
        out[17..19].copy_from_slice(&self.code.to_le_bytes());
        out[19..23].copy_from_slice(&self.payload_size.to_le_bytes());
        out
    }

    /// Decodes a header, returning it and the remaining bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), WireError> {
        if bytes.len() < REQUEST_HEADER_SIZE {
            return Err(WireError::MalformedHeader {
                needed: REQUEST_HEADER_SIZE,
                got: bytes.len(),
            });
        }
        let mut client_id = [0u8; CLIENT_ID_LEN];
        client_id.copy_from_slice(&bytes[..16]);
        let header = RequestHeader {
            client_id,
            version: bytes[16],
            code: u16::from_le_bytes([bytes[17], bytes[18]]),
            payload_size: u32::from_le_bytes([bytes[19], bytes[20], bytes[21], bytes[22]]),
        };
        Ok((header, &bytes[REQUEST_HEADER_SIZE..]))
    }
}

/// Header prefixed to every server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub version: u8,
    /// Kept as a raw integer: unknown codes must survive decoding so the
    /// session layer can report them.
    pub code: u16,
    pub payload_size: u32,
}

impl ResponseHeader {
    pub fn new(code: ResponseCode, payload_size: u32) -> Self {
        ResponseHeader {
            version: PROTOCOL_VERSION,
            code: code as u16,
            payload_size,
        }
    }

    /// Serializes the header into its packed 7-byte layout.
    pub fn to_bytes(&self) -> [u8; RESPONSE_HEADER_SIZE] {
        let mut out = [0u8; RESPONSE_HEADER_SIZE];
        out[0] = self.version;
        out[1..3].copy_from_slice(&self.code.to_le_bytes());
        out[3..7].copy_from_slice(&self.payload_size.to_le_bytes());
        out
    }

    /// Decodes a header, returning it and the remaining bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), WireError> {
        if bytes.len() < RESPONSE_HEADER_SIZE {
            return Err(WireError::MalformedHeader {
                needed: RESPONSE_HEADER_SIZE,
                got: bytes.len(),
            });
        }
        let header = ResponseHeader {
            version: bytes[0],
            code: u16::from_le_bytes([bytes[1], bytes[2]]),
            payload_size: u32::from_le_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]),
        };
        Ok((header, &bytes[RESPONSE_HEADER_SIZE..]))
    }
}
