// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Client Identity
//!
//! This client's registered identity: the server-assigned 16-byte id, the
//! display name and the private half of the identity keypair. Created
//! once at registration or loaded from the identity file, then immutable
//! for the life of the process.
//!
//! The file layout is human-readable, one field per line:
//! display name, hex-encoded id, base64-encoded secret key.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use thiserror::Error;
use zeroize::Zeroize;

use crate::crypto::PRIVATE_KEY_LEN;
use crate::wire::{ClientId, CLIENT_ID_LEN, PUBLIC_KEY_LEN};

/// Default identity file name, next to the working directory.
pub const DEFAULT_IDENTITY_FILE: &str = "me.info";

/// Identity persistence errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("an identity file already exists")]
    AlreadyExists,

    #[error("identity file is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// This client's registered identity.
pub struct ClientIdentity {
    id: ClientId,
    name: String,
    secret: [u8; PRIVATE_KEY_LEN],
}

impl Drop for ClientIdentity {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("id", &hex::encode(self.id))
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl ClientIdentity {
    pub fn new(id: ClientId, name: String, secret: [u8; PRIVATE_KEY_LEN]) -> Self {
        ClientIdentity { id, name, secret }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.secret
    }

    /// Recomputes the public key blob from the stored secret, padded into
    /// the fixed wire field.
    pub fn public_key_blob(&self) -> [u8; PUBLIC_KEY_LEN] {
        let secret = x25519_dalek::StaticSecret::from(self.secret);
        let public = x25519_dalek::PublicKey::from(&secret);
        crate::crypto::asymmetric::pad_public_key(public.as_bytes())
    }
}

/// Load/save capability for the persisted identity.
///
/// `save` is idempotent-once: it fails if an identity is already on disk,
/// which the session layer surfaces as a duplicate registration.
pub trait IdentityStore: Send {
    fn load(&self) -> Result<Option<ClientIdentity>, IdentityError>;
    fn save(&self, identity: &ClientIdentity) -> Result<(), IdentityError>;
}

/// File-backed identity store.
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileIdentityStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<ClientIdentity>, IdentityError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let mut lines = content.lines();

        let name = lines
            .next()
            .ok_or_else(|| IdentityError::Malformed("missing name line".to_string()))?
            .to_string();

        let id_hex = lines
            .next()
            .ok_or_else(|| IdentityError::Malformed("missing id line".to_string()))?;
        let id_bytes =
            hex::decode(id_hex.trim()).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        let id: ClientId = id_bytes.as_slice().try_into().map_err(|_| {
            IdentityError::Malformed(format!(
                "id must be {CLIENT_ID_LEN} bytes, got {}",
                id_bytes.len()
            ))
        })?;

        let key_b64 = lines
            .next()
            .ok_or_else(|| IdentityError::Malformed("missing key line".to_string()))?;
        let key_bytes = base64::engine::general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;
        let secret: [u8; PRIVATE_KEY_LEN] = key_bytes.as_slice().try_into().map_err(|_| {
            IdentityError::Malformed(format!(
                "secret key must be {PRIVATE_KEY_LEN} bytes, got {}",
                key_bytes.len()
            ))
        })?;

        Ok(Some(ClientIdentity { id, name, secret }))
    }

    fn save(&self, identity: &ClientIdentity) -> Result<(), IdentityError> {
        if self.path.exists() {
            return Err(IdentityError::AlreadyExists);
        }

        let mut file = fs::File::create(&self.path)?;
        writeln!(file, "{}", identity.name)?;
        writeln!(file, "{}", hex::encode(identity.id))?;
        writeln!(
            file,
            "{}",
            base64::engine::general_purpose::STANDARD.encode(identity.secret)
        )?;
        Ok(())
    }
}
