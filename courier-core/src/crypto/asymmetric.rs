// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Asymmetric key wrap using X25519 and ChaCha20Poly1305.
//!
//! Sealed-box construction:
//! 1. Generate an ephemeral X25519 keypair
//! 2. ECDH with the recipient's static public key
//! 3. Derive a wrap key with HKDF-SHA256
//! 4. Encrypt with ChaCha20Poly1305
//!
//! Output format: `ephemeral_public (32) || nonce (12) || ciphertext`.
//!
//! The wire format reserves a fixed 160-byte field for public keys; the
//! 32-byte X25519 key occupies the front of that field, the rest is zero.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use super::{CryptoError, PRIVATE_KEY_LEN};
use crate::wire::PUBLIC_KEY_LEN;

/// HKDF info string for key derivation.
const HKDF_INFO: &[u8] = b"COURIER-V1-KEY-WRAP";

/// Nonce size for ChaCha20Poly1305.
const NONCE_SIZE: usize = 12;

/// Minimum sealed-box size: ephemeral key (32) + nonce (12) + tag (16).
const MIN_SEALED_SIZE: usize = 32 + NONCE_SIZE + 16;

/// Asymmetric-crypto capability: encrypt to a peer's public key blob,
/// decrypt with this client's private key.
pub trait AsymmetricCipher: Send {
    fn encrypt(
        &self,
        recipient_public: &[u8; PUBLIC_KEY_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

/// Production sealed-box cipher.
#[derive(Debug, Default, Clone, Copy)]
pub struct SealedBoxCipher;

/// Generates a static identity keypair. The public half is returned
/// already padded into the fixed wire field.
pub fn generate_keypair() -> ([u8; PRIVATE_KEY_LEN], [u8; PUBLIC_KEY_LEN]) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (secret.to_bytes(), pad_public_key(public.as_bytes()))
}

/// Pads a 32-byte X25519 public key into the 160-byte wire field.
pub fn pad_public_key(key: &[u8; 32]) -> [u8; PUBLIC_KEY_LEN] {
    let mut blob = [0u8; PUBLIC_KEY_LEN];
    blob[..32].copy_from_slice(key);
    blob
}

fn derive_wrap_key(shared_secret: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut wrap_key = [0u8; 32];
    hk.expand(HKDF_INFO, &mut wrap_key)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(wrap_key)
}

impl AsymmetricCipher for SealedBoxCipher {
    fn encrypt(
        &self,
        recipient_public: &[u8; PUBLIC_KEY_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&recipient_public[..32]);
        let recipient = PublicKey::from(key_bytes);

        let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral_secret);
        let shared_secret = ephemeral_secret.diffie_hellman(&recipient);

        let wrap_key = derive_wrap_key(shared_secret.as_bytes())?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::RngCore::fill_bytes(&mut OsRng, &mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(32 + NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(
        &self,
        private_key: &[u8; PRIVATE_KEY_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < MIN_SEALED_SIZE {
            return Err(CryptoError::CiphertextTooShort);
        }

        let mut ephemeral_bytes = [0u8; 32];
        ephemeral_bytes.copy_from_slice(&ciphertext[..32]);
        let ephemeral_public = PublicKey::from(ephemeral_bytes);

        let secret = StaticSecret::from(*private_key);
        let shared_secret = secret.diffie_hellman(&ephemeral_public);

        let wrap_key = derive_wrap_key(shared_secret.as_bytes())
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let cipher = ChaCha20Poly1305::new_from_slice(&wrap_key)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = Nonce::from_slice(&ciphertext[32..32 + NONCE_SIZE]);

        cipher
            .decrypt(nonce, &ciphertext[32 + NONCE_SIZE..])
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
