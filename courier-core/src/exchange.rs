// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key Exchange Engine
//!
//! Takes a peer from "no key material" to "usable symmetric session key".
//! Outbound: generate a fresh key and seal it for the peer's public key.
//! Inbound: open a peer-sent blob with our private key.
//!
//! The engine computes; it does not mutate the directory. Callers store
//! the resulting key only after the whole operation (including the
//! network send, for the outbound path) has succeeded, so a failure never
//! leaves partial state behind.

use thiserror::Error;

use crate::crypto::{AsymmetricCipher, CryptoError, SessionKey, PRIVATE_KEY_LEN, SESSION_KEY_LEN};
use crate::directory::PeerRecord;

/// Key-exchange errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("no public key on file for peer {0}")]
    MissingKeyMaterial(String),

    #[error("peer sent a session key of {0} bytes, expected {SESSION_KEY_LEN}")]
    BadKeyLength(usize),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Drives the per-peer key-exchange transitions.
pub struct KeyExchange<A: AsymmetricCipher> {
    cipher: A,
}

impl<A: AsymmetricCipher> KeyExchange<A> {
    pub fn new(cipher: A) -> Self {
        KeyExchange { cipher }
    }

    /// Outbound path: generates a fresh session key and seals it for the
    /// peer. Returns the plaintext key (to be stored once the send
    /// succeeds) and the sealed blob (the KeySend content).
    pub fn wrap_new_session_key(
        &self,
        peer: &PeerRecord,
    ) -> Result<(SessionKey, Vec<u8>), ExchangeError> {
        let public_key = peer
            .public_key
            .as_ref()
            .ok_or_else(|| ExchangeError::MissingKeyMaterial(peer.name.clone()))?;

        let key = SessionKey::generate();
        let sealed = self.cipher.encrypt(public_key, key.as_bytes())?;
        Ok((key, sealed))
    }

    /// Inbound path: opens a peer-sent KeySend blob with our private key
    /// and returns the recovered session key.
    pub fn unwrap_session_key(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        sealed: &[u8],
    ) -> Result<SessionKey, ExchangeError> {
        let recovered = self.cipher.decrypt(private_key, sealed)?;
        let bytes: [u8; SESSION_KEY_LEN] = recovered
            .as_slice()
            .try_into()
            .map_err(|_| ExchangeError::BadKeyLength(recovered.len()))?;
        Ok(SessionKey::from_bytes(bytes))
    }

    pub fn cipher(&self) -> &A {
        &self.cipher
    }
}
