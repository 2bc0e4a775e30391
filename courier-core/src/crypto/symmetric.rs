// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric message encryption (AES-128-GCM).
//!
//! Ciphertext format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! The nonce is random per message; a fixed IV would let an observer
//! correlate identical plaintexts across messages.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use super::{CryptoError, SessionKey};

/// Nonce size for AES-128-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// Symmetric-crypto capability: encrypt/decrypt bytes with a session key.
pub trait SymmetricCipher: Send {
    fn encrypt(&self, key: &SessionKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn decrypt(&self, key: &SessionKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Production cipher backed by ring's AES-128-GCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmCipher;

impl SymmetricCipher for AesGcmCipher {
    fn encrypt(&self, key: &SessionKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let rng = SystemRandom::new();

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rng.fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let unbound_key = UnboundKey::new(&AES_128_GCM, key.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let sealing_key = LessSafeKey::new(unbound_key);

        let mut in_out = plaintext.to_vec();
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);
        sealing_key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut output = Vec::with_capacity(NONCE_SIZE + in_out.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&in_out);

        Ok(output)
    }

    fn decrypt(&self, key: &SessionKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let min_size = NONCE_SIZE + AES_128_GCM.tag_len();
        if ciphertext.len() < min_size {
            return Err(CryptoError::CiphertextTooShort);
        }

        let nonce_bytes: [u8; NONCE_SIZE] = ciphertext[..NONCE_SIZE]
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let unbound_key = UnboundKey::new(&AES_128_GCM, key.as_bytes())
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let opening_key = LessSafeKey::new(unbound_key);

        let mut buffer = ciphertext[NONCE_SIZE..].to_vec();
        let plaintext = opening_key
            .open_in_place(nonce, Aad::empty(), &mut buffer)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = AesGcmCipher;
        let key = SessionKey::generate();
        let plaintext = b"short message";

        let ciphertext = cipher.encrypt(&key, plaintext).unwrap();
        assert_ne!(&ciphertext[NONCE_SIZE..], plaintext.as_slice());

        let decrypted = cipher.decrypt(&key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = AesGcmCipher;
        let ciphertext = cipher.encrypt(&SessionKey::generate(), b"data").unwrap();
        let result = cipher.decrypt(&SessionKey::generate(), &ciphertext);
        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn short_ciphertext_rejected() {
        let cipher = AesGcmCipher;
        let result = cipher.decrypt(&SessionKey::generate(), &[0u8; 10]);
        assert_eq!(result, Err(CryptoError::CiphertextTooShort));
    }
}
