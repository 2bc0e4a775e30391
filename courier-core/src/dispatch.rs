// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Dispatch Engine
//!
//! Builds outgoing encrypted envelopes and turns incoming waiting-message
//! batches into typed events. Sits between the wire codec and the session
//! facade; all crypto goes through the injected capabilities.

use thiserror::Error;

use crate::crypto::{
    AsymmetricCipher, CryptoError, SessionKey, SymmetricCipher, PRIVATE_KEY_LEN,
};
use crate::directory::{DirectoryError, PeerDirectory, PeerRecord};
use crate::exchange::{ExchangeError, KeyExchange};
use crate::wire::{
    self, ClientId, MessageKind, WaitingRecord, WireError,
};

/// Dispatch-level errors. `UnknownMessageKind` and `UnknownSender` are
/// per-record: the caller keeps draining the rest of the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("message from unknown sender {0}")]
    UnknownSender(String),

    #[error("no session key established with peer {0}")]
    MissingSessionKey(String),

    #[error("unknown message kind {0}")]
    UnknownMessageKind(u8),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// One outbound message before wire encoding.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub peer_id: ClientId,
    pub kind: MessageKind,
    pub content: Vec<u8>,
}

impl Envelope {
    /// Encodes the envelope into a send-message payload.
    pub fn encode(&self) -> Vec<u8> {
        wire::encode_send_payload(&self.peer_id, self.kind as u8, &self.content)
    }
}

/// One incoming message after interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretedEvent {
    /// The peer asked us to send them a session key. No automatic reply:
    /// handing out a key is a user decision.
    KeyRequested { peer: String, message_id: u32 },
    /// The peer sent us a session key; it is now recorded against them.
    SessionKeyEstablished { peer: String, message_id: u32 },
    /// Decrypted text message.
    TextReceived {
        peer: String,
        message_id: u32,
        text: String,
    },
    /// Decrypted file bytes. Writing them anywhere is the caller's job.
    FileReceived {
        peer: String,
        message_id: u32,
        bytes: Vec<u8>,
    },
}

/// Decodes a waiting-message batch into records. One-shot: the whole
/// buffer is consumed, in order, or the decode fails.
pub fn drain_batch(batch: &[u8]) -> Result<Vec<WaitingRecord>, WireError> {
    wire::decode_waiting_records(batch)
}

/// Builds envelopes and interprets incoming records.
pub struct MessageDispatch<A: AsymmetricCipher, S: SymmetricCipher> {
    exchange: KeyExchange<A>,
    cipher: S,
}

impl<A: AsymmetricCipher, S: SymmetricCipher> MessageDispatch<A, S> {
    pub fn new(asymmetric: A, symmetric: S) -> Self {
        MessageDispatch {
            exchange: KeyExchange::new(asymmetric),
            cipher: symmetric,
        }
    }

    pub fn exchange(&self) -> &KeyExchange<A> {
        &self.exchange
    }

    /// Builds an envelope for a Text, File or KeyRequest message.
    ///
    /// Text and File require an established session key; failing that
    /// precondition leaves the peer record untouched. KeySend envelopes
    /// are built with [`Self::build_key_send`] because they also produce
    /// the key to be stored.
    pub fn build_envelope(
        &self,
        peer: &PeerRecord,
        kind: MessageKind,
        plaintext: &[u8],
    ) -> Result<Envelope, DispatchError> {
        let content = match kind {
            MessageKind::KeyRequest => Vec::new(),
            MessageKind::Text | MessageKind::File => {
                let key = peer
                    .session_key
                    .as_ref()
                    .ok_or_else(|| DispatchError::MissingSessionKey(peer.name.clone()))?;
                self.cipher.encrypt(key, plaintext)?
            }
            MessageKind::KeySend => {
                // Produced alongside a fresh key; see build_key_send.
                let (_, sealed) = self.exchange.wrap_new_session_key(peer)?;
                sealed
            }
        };

        Ok(Envelope {
            peer_id: peer.id,
            kind,
            content,
        })
    }

    /// Builds a KeySend envelope together with the freshly generated
    /// session key. The caller records the key only after the envelope
    /// has actually been delivered to the server.
    pub fn build_key_send(
        &self,
        peer: &PeerRecord,
    ) -> Result<(Envelope, SessionKey), DispatchError> {
        let (key, sealed) = self.exchange.wrap_new_session_key(peer)?;
        Ok((
            Envelope {
                peer_id: peer.id,
                kind: MessageKind::KeySend,
                content: sealed,
            },
            key,
        ))
    }

    /// Resolves one record against the directory and decrypts it into an
    /// event. A `KeySend` record updates the sender's session key as a
    /// side effect; every other outcome leaves the directory unchanged.
    pub fn interpret(
        &self,
        record: &WaitingRecord,
        directory: &mut PeerDirectory,
        private_key: &[u8; PRIVATE_KEY_LEN],
    ) -> Result<InterpretedEvent, DispatchError> {
        let sender = directory
            .find_by_id(&record.sender_id)
            .map_err(|_| DispatchError::UnknownSender(hex::encode(record.sender_id)))?;
        let peer = sender.name.clone();

        let kind = MessageKind::from_u8(record.kind)
            .ok_or(DispatchError::UnknownMessageKind(record.kind))?;

        match kind {
            MessageKind::KeyRequest => Ok(InterpretedEvent::KeyRequested {
                peer,
                message_id: record.message_id,
            }),
            MessageKind::KeySend => {
                let key = self
                    .exchange
                    .unwrap_session_key(private_key, &record.content)?;
                directory.record_session_key(&peer, key)?;
                Ok(InterpretedEvent::SessionKeyEstablished {
                    peer,
                    message_id: record.message_id,
                })
            }
            MessageKind::Text => {
                let key = sender
                    .session_key
                    .as_ref()
                    .ok_or_else(|| DispatchError::MissingSessionKey(peer.clone()))?;
                let plaintext = self.cipher.decrypt(key, &record.content)?;
                Ok(InterpretedEvent::TextReceived {
                    peer,
                    message_id: record.message_id,
                    text: String::from_utf8_lossy(&plaintext).into_owned(),
                })
            }
            MessageKind::File => {
                let key = sender
                    .session_key
                    .as_ref()
                    .ok_or_else(|| DispatchError::MissingSessionKey(peer.clone()))?;
                let bytes = self.cipher.decrypt(key, &record.content)?;
                Ok(InterpretedEvent::FileReceived {
                    peer,
                    message_id: record.message_id,
                    bytes,
                })
            }
        }
    }
}
