// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Peer Directory
//!
//! Process-local registry of every peer this client has seen, keyed by
//! display name for user-facing lookups and by id for inbound messages.
//! The directory is additive: records are never deleted during a session,
//! and refreshing the peer list never clears key material.

use thiserror::Error;

use crate::crypto::SessionKey;
use crate::wire::{ClientId, PUBLIC_KEY_LEN};

/// Directory lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("unknown peer: {0}")]
    UnknownPeer(String),
}

/// How far the key exchange with a peer has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No key material on file.
    NoKey,
    /// The peer's public key has been fetched.
    PublicKeyKnown,
    /// A symmetric session key is usable for direct messages.
    SessionKeyEstablished,
}

/// One remote client known to this client.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub id: ClientId,
    pub name: String,
    pub public_key: Option<[u8; PUBLIC_KEY_LEN]>,
    pub session_key: Option<SessionKey>,
}

impl PeerRecord {
    /// Derives the key-exchange state from the key material on file.
    ///
    /// A session key can arrive by decrypting a peer-sent blob before we
    /// ever fetched the peer's public key, so `SessionKeyEstablished`
    /// does not require `public_key` to be present.
    pub fn key_state(&self) -> KeyState {
        if self.session_key.is_some() {
            KeyState::SessionKeyEstablished
        } else if self.public_key.is_some() {
            KeyState::PublicKeyKnown
        } else {
            KeyState::NoKey
        }
    }
}

/// Directory of known peers.
///
/// Lookups are linear scans. The directory holds the handful of clients
/// registered against one relay, so an index would buy nothing; if that
/// ever changes, only this type needs to learn about it.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: Vec<PeerRecord>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        PeerDirectory { peers: Vec::new() }
    }

    /// Inserts a peer observed in a list response, or refreshes the id of
    /// an existing record with the same name. Key material already on
    /// file is left untouched.
    pub fn upsert_from_list(&mut self, id: ClientId, name: &str) {
        match self.peers.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.id = id,
            None => self.peers.push(PeerRecord {
                id,
                name: name.to_string(),
                public_key: None,
                session_key: None,
            }),
        }
    }

    /// Stores a fetched public key. The peer must already be on file.
    pub fn record_public_key(
        &mut self,
        name: &str,
        key: [u8; PUBLIC_KEY_LEN],
    ) -> Result<(), DirectoryError> {
        let peer = self.find_by_name_mut(name)?;
        peer.public_key = Some(key);
        Ok(())
    }

    /// Stores a session key, advancing the peer to
    /// `SessionKeyEstablished`. Last write wins regardless of whether the
    /// key was generated locally or decrypted from a peer-sent blob.
    pub fn record_session_key(
        &mut self,
        name: &str,
        key: SessionKey,
    ) -> Result<(), DirectoryError> {
        let peer = self.find_by_name_mut(name)?;
        peer.session_key = Some(key);
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Result<&PeerRecord, DirectoryError> {
        self.peers
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DirectoryError::UnknownPeer(name.to_string()))
    }

    pub fn find_by_id(&self, id: &ClientId) -> Result<&PeerRecord, DirectoryError> {
        self.peers
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| DirectoryError::UnknownPeer(hex::encode(id)))
    }

    /// Iterates over all known peers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    fn find_by_name_mut(&mut self, name: &str) -> Result<&mut PeerRecord, DirectoryError> {
        self.peers
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| DirectoryError::UnknownPeer(name.to_string()))
    }
}
