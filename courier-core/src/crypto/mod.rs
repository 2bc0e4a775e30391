// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cryptographic capabilities.
//!
//! The session engine never touches a primitive directly; it goes through
//! the [`AsymmetricCipher`] and [`SymmetricCipher`] traits so the
//! primitives can be swapped or mocked. The production implementations
//! live in this module.

pub mod asymmetric;
pub mod symmetric;

pub use asymmetric::{generate_keypair, AsymmetricCipher, SealedBoxCipher};
pub use symmetric::{AesGcmCipher, SymmetricCipher};

use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroize;

/// Length of a per-peer symmetric session key.
pub const SESSION_KEY_LEN: usize = 16;
/// Length of the private half of the identity keypair.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Primitive-level crypto errors. Any of these aborts the operation in
/// progress with no state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed: data may be corrupted or wrong key")]
    DecryptionFailed,
    #[error("ciphertext too short")]
    CiphertextTooShort,
}

/// 128-bit symmetric session key shared with exactly one peer.
#[derive(Clone)]
pub struct SessionKey {
    bytes: [u8; SESSION_KEY_LEN],
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SessionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SessionKey {
    /// Generates a new random session key.
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; SESSION_KEY_LEN];
        rng.fill(&mut bytes).expect("System RNG should not fail");
        SessionKey { bytes }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        SessionKey { bytes }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.bytes
    }
}
