// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Payload encoding and decoding.
//!
//! Pure functions over byte buffers; no protocol state lives here.

use super::{
    ClientId, RequestHeader, WireError, CLIENT_ID_LEN, MAX_NAME_LEN, PEER_ENTRY_SIZE,
    PUBLIC_KEY_LEN, REGISTRATION_PAYLOAD_SIZE, SEND_PAYLOAD_HEADER_SIZE,
    WAITING_RECORD_HEADER_SIZE,
};

/// One queued message decoded from a waiting-message batch.
///
/// The kind is kept as a raw byte: a record with an unrecognized kind is
/// still a well-formed record and must not break the batch scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingRecord {
    pub sender_id: ClientId,
    pub message_id: u32,
    pub kind: u8,
    pub content: Vec<u8>,
}

/// Concatenates a request header and payload into one wire buffer.
pub fn encode_request(header: &RequestHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(header.to_bytes().len() + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(payload);
    out
}

/// Writes a name into a fixed null-padded wire field.
///
/// At least one terminating null must fit, so the name is capped one byte
/// below the field width.
fn encode_name_field(name: &str) -> Result<[u8; MAX_NAME_LEN], WireError> {
    let bytes = name.as_bytes();
    if bytes.len() >= MAX_NAME_LEN {
        return Err(WireError::NameTooLong);
    }
    let mut field = [0u8; MAX_NAME_LEN];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

/// Reads a null-padded name field back into a string.
fn decode_name_field(field: &[u8]) -> Result<String, WireError> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_owned)
        .map_err(|_| WireError::InvalidName)
}

/// Builds the 415-byte registration payload: null-padded name followed by
/// the public key blob.
pub fn encode_registration_payload(
    name: &str,
    public_key: &[u8; PUBLIC_KEY_LEN],
) -> Result<Vec<u8>, WireError> {
    let name_field = encode_name_field(name)?;
    let mut out = Vec::with_capacity(REGISTRATION_PAYLOAD_SIZE);
    out.extend_from_slice(&name_field);
    out.extend_from_slice(public_key);
    Ok(out)
}

/// Builds one send-message payload: destination id, kind byte, content
/// length, then the content itself.
pub fn encode_send_payload(destination: &ClientId, kind: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SEND_PAYLOAD_HEADER_SIZE + content.len());
    out.extend_from_slice(destination);
    out.push(kind);
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(content);
    out
}

/// Decodes a peer-list payload into `(id, name)` pairs.
///
/// The payload must be an exact multiple of the 271-byte entry size;
/// anything else indicates a truncated or garbled response.
pub fn decode_peer_entries(payload: &[u8]) -> Result<Vec<(ClientId, String)>, WireError> {
    if payload.len() % PEER_ENTRY_SIZE != 0 {
        return Err(WireError::MalformedHeader {
            needed: PEER_ENTRY_SIZE,
            got: payload.len() % PEER_ENTRY_SIZE,
        });
    }
    let mut entries = Vec::with_capacity(payload.len() / PEER_ENTRY_SIZE);
    for chunk in payload.chunks_exact(PEER_ENTRY_SIZE) {
        let mut id = [0u8; CLIENT_ID_LEN];
        id.copy_from_slice(&chunk[..CLIENT_ID_LEN]);
        let name = decode_name_field(&chunk[CLIENT_ID_LEN..])?;
        entries.push((id, name));
    }
    Ok(entries)
}

/// Encodes one peer-list entry the way the server does. Used by test
/// doubles scripting list responses.
pub fn encode_peer_entry(id: &ClientId, name: &str) -> Result<Vec<u8>, WireError> {
    let name_field = encode_name_field(name)?;
    let mut out = Vec::with_capacity(PEER_ENTRY_SIZE);
    out.extend_from_slice(id);
    out.extend_from_slice(&name_field);
    Ok(out)
}

/// Encodes one waiting-message record the way the server does. Used by
/// test doubles scripting poll responses.
pub fn encode_waiting_record(
    sender_id: &ClientId,
    message_id: u32,
    kind: u8,
    content: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(WAITING_RECORD_HEADER_SIZE + content.len());
    out.extend_from_slice(sender_id);
    out.extend_from_slice(&message_id.to_le_bytes());
    out.push(kind);
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(content);
    out
}

/// Scans a waiting-message batch into individual records.
///
/// Linear scan: decode one record header at the current offset, slice the
/// declared content, advance. The batch must be consumed exactly; a
/// content length running past the end of the buffer is a
/// `TruncatedBatch` and no partial record is returned.
pub fn decode_waiting_records(batch: &[u8]) -> Result<Vec<WaitingRecord>, WireError> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < batch.len() {
        let remaining = &batch[offset..];
        if remaining.len() < WAITING_RECORD_HEADER_SIZE {
            return Err(WireError::MalformedHeader {
                needed: WAITING_RECORD_HEADER_SIZE,
                got: remaining.len(),
            });
        }

        let mut sender_id = [0u8; CLIENT_ID_LEN];
        sender_id.copy_from_slice(&remaining[..16]);
        let message_id = u32::from_le_bytes([
            remaining[16],
            remaining[17],
            remaining[18],
            remaining[19],
        ]);
        let kind = remaining[20];
        let content_len = u32::from_le_bytes([
            remaining[21],
            remaining[22],
            remaining[23],
            remaining[24],
        ]) as usize;

        let content_start = WAITING_RECORD_HEADER_SIZE;
        if remaining.len() - content_start < content_len {
            return Err(WireError::TruncatedBatch {
                offset,
                declared: content_len,
                remaining: remaining.len() - content_start,
            });
        }

        records.push(WaitingRecord {
            sender_id,
            message_id,
            kind,
            content: remaining[content_start..content_start + content_len].to_vec(),
        });
        offset += WAITING_RECORD_HEADER_SIZE + content_len;
    }

    Ok(records)
}
