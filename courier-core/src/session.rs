// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Facade
//!
//! One method per protocol action, each a single blocking round trip
//! through the injected [`Transport`]. Owns the peer directory, the
//! optional client identity and the crypto capabilities; everything else
//! is delegated to the engines underneath.

use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::{
    asymmetric::generate_keypair, AesGcmCipher, AsymmetricCipher, SealedBoxCipher,
    SymmetricCipher,
};
use crate::directory::{DirectoryError, PeerDirectory};
use crate::dispatch::{drain_batch, DispatchError, Envelope, InterpretedEvent, MessageDispatch};
use crate::identity::{ClientIdentity, IdentityError, IdentityStore};
use crate::network::{NetworkError, Transport};
use crate::wire::{
    self, ClientId, MessageKind, RequestCode, RequestHeader, CLIENT_ID_LEN, PUBLIC_KEY_LEN,
};

/// Size of the acknowledgment payload for a queued message:
/// destination id (16) + server-assigned message id (4).
const SEND_ACK_SIZE: usize = CLIENT_ID_LEN + 4;
/// Size of a public-key response payload: peer id (16) + key blob (160).
const PUBLIC_KEY_RESPONSE_SIZE: usize = CLIENT_ID_LEN + PUBLIC_KEY_LEN;

/// Session-level errors. Every failure is terminal for its operation;
/// nothing here is retried automatically.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not registered: no client identity exists")]
    NotRegistered,

    #[error("already registered: a client identity exists")]
    AlreadyRegistered,

    #[error("an identity with this username already exists")]
    DuplicateUsername,

    #[error("server rejected the request with code {0}")]
    ServerRejected(u16),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error(transparent)]
    Wire(#[from] wire::WireError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Outcome of interpreting one polled record. Per-record failures
/// (unknown sender, unknown kind, missing key) do not abort the batch;
/// the caller decides whether to surface or drop them.
pub type PollResult = Result<InterpretedEvent, DispatchError>;

/// The protocol session engine facade.
///
/// Single-threaded and synchronous by design: each operation performs
/// exactly one request and blocks until the full response has arrived.
pub struct SessionClient<T, A = SealedBoxCipher, S = AesGcmCipher>
where
    T: Transport,
    A: AsymmetricCipher,
    S: SymmetricCipher,
{
    transport: T,
    store: Box<dyn IdentityStore>,
    dispatch: MessageDispatch<A, S>,
    directory: PeerDirectory,
    identity: Option<ClientIdentity>,
}

impl<T: Transport> SessionClient<T> {
    /// Creates a client with the production ciphers, loading any
    /// persisted identity from the store.
    pub fn new(transport: T, store: Box<dyn IdentityStore>) -> Result<Self, SessionError> {
        Self::with_ciphers(transport, store, SealedBoxCipher, AesGcmCipher)
    }
}

impl<T, A, S> SessionClient<T, A, S>
where
    T: Transport,
    A: AsymmetricCipher,
    S: SymmetricCipher,
{
    /// Creates a client with explicit cipher capabilities.
    pub fn with_ciphers(
        transport: T,
        store: Box<dyn IdentityStore>,
        asymmetric: A,
        symmetric: S,
    ) -> Result<Self, SessionError> {
        let identity = store.load()?;
        Ok(SessionClient {
            transport,
            store,
            dispatch: MessageDispatch::new(asymmetric, symmetric),
            directory: PeerDirectory::new(),
            identity,
        })
    }

    /// The registered identity, if any.
    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// Read access to the peer directory.
    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Mutable access to the transport, e.g. to script a [`MockTransport`]
    /// between operations.
    ///
    /// [`MockTransport`]: crate::network::MockTransport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Registers this client with the relay server.
    ///
    /// The check is local identity presence only; username uniqueness is
    /// the server's call and comes back as a rejection.
    pub fn register(&mut self, name: &str) -> Result<&ClientIdentity, SessionError> {
        if self.identity.is_some() {
            return Err(SessionError::AlreadyRegistered);
        }

        let (secret, public_blob) = generate_keypair();
        let payload = wire::encode_registration_payload(name, &public_blob)?;
        let response = self.round_trip([0u8; CLIENT_ID_LEN], RequestCode::Register, &payload)?;

        let id: ClientId = response.as_slice().try_into().map_err(|_| {
            SessionError::ProtocolViolation(format!(
                "registration response must be {CLIENT_ID_LEN} bytes, got {}",
                response.len()
            ))
        })?;

        let identity = ClientIdentity::new(id, name.to_string(), secret);
        self.store.save(&identity).map_err(|e| match e {
            IdentityError::AlreadyExists => SessionError::DuplicateUsername,
            other => SessionError::Identity(other),
        })?;

        info!(name, id = %hex::encode(id), "registered with relay");
        Ok(self.identity.insert(identity))
    }

    /// Fetches the server's client list and folds it into the directory.
    /// Returns the entries in server order.
    pub fn list_peers(&mut self) -> Result<Vec<(ClientId, String)>, SessionError> {
        let client_id = self.require_registered()?;
        let payload = self.round_trip(client_id, RequestCode::ListPeers, &[])?;

        let entries = wire::decode_peer_entries(&payload)
            .map_err(|e| SessionError::ProtocolViolation(e.to_string()))?;
        for (id, name) in &entries {
            self.directory.upsert_from_list(*id, name);
        }
        Ok(entries)
    }

    /// Fetches a peer's public key and records it in the directory.
    pub fn fetch_public_key(&mut self, name: &str) -> Result<(), SessionError> {
        let client_id = self.require_registered()?;
        let peer_id = self.directory.find_by_name(name)?.id;

        let response = self.round_trip(client_id, RequestCode::FetchPublicKey, &peer_id)?;
        if response.len() != PUBLIC_KEY_RESPONSE_SIZE {
            return Err(SessionError::ProtocolViolation(format!(
                "public-key response must be {PUBLIC_KEY_RESPONSE_SIZE} bytes, got {}",
                response.len()
            )));
        }
        if response[..CLIENT_ID_LEN] != peer_id {
            return Err(SessionError::ProtocolViolation(
                "public-key response names a different peer".to_string(),
            ));
        }

        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(&response[CLIENT_ID_LEN..]);
        self.directory.record_public_key(name, key)?;
        Ok(())
    }

    /// Asks a peer to send us a session key. Returns the server-assigned
    /// message id.
    pub fn request_session_key(&mut self, name: &str) -> Result<u32, SessionError> {
        let peer = self.directory.find_by_name(name)?;
        let envelope = self
            .dispatch
            .build_envelope(peer, MessageKind::KeyRequest, &[])?;
        self.send_envelope(&envelope)
    }

    /// Generates a fresh session key, sends it to the peer sealed under
    /// their public key, and records it locally once the send succeeds.
    pub fn send_session_key(&mut self, name: &str) -> Result<u32, SessionError> {
        let peer = self.directory.find_by_name(name)?;
        let (envelope, key) = self.dispatch.build_key_send(peer)?;

        let message_id = self.send_envelope(&envelope)?;

        // The sender trusts its own generation: the plaintext key becomes
        // this peer's session key, but only now that the relay has it.
        self.directory.record_session_key(name, key)?;
        Ok(message_id)
    }

    /// Sends an encrypted text message. Requires an established session
    /// key with the peer.
    pub fn send_text(&mut self, name: &str, text: &str) -> Result<u32, SessionError> {
        let peer = self.directory.find_by_name(name)?;
        let envelope = self
            .dispatch
            .build_envelope(peer, MessageKind::Text, text.as_bytes())?;
        self.send_envelope(&envelope)
    }

    /// Sends an encrypted file. Requires an established session key with
    /// the peer.
    pub fn send_file(&mut self, name: &str, bytes: &[u8]) -> Result<u32, SessionError> {
        let peer = self.directory.find_by_name(name)?;
        let envelope = self
            .dispatch
            .build_envelope(peer, MessageKind::File, bytes)?;
        self.send_envelope(&envelope)
    }

    /// Fetches and interprets all waiting messages. Decode failures abort
    /// the poll; interpretation failures are per-record.
    pub fn poll_messages(&mut self) -> Result<Vec<PollResult>, SessionError> {
        let client_id = self.require_registered()?;
        let payload = self.round_trip(client_id, RequestCode::PollMessages, &[])?;

        let records = drain_batch(&payload)?;
        debug!(count = records.len(), "drained waiting-message batch");

        let Some(identity) = &self.identity else {
            return Err(SessionError::NotRegistered);
        };

        let mut results = Vec::with_capacity(records.len());
        for record in &records {
            results.push(
                self.dispatch
                    .interpret(record, &mut self.directory, identity.secret()),
            );
        }
        Ok(results)
    }

    fn require_registered(&self) -> Result<ClientId, SessionError> {
        self.identity
            .as_ref()
            .map(|identity| *identity.id())
            .ok_or(SessionError::NotRegistered)
    }

    /// Sends one envelope and validates the server's acknowledgment.
    fn send_envelope(&mut self, envelope: &Envelope) -> Result<u32, SessionError> {
        let client_id = self.require_registered()?;
        let payload = envelope.encode();
        let response = self.round_trip(client_id, RequestCode::SendMessage, &payload)?;

        if response.len() != SEND_ACK_SIZE {
            return Err(SessionError::ProtocolViolation(format!(
                "send acknowledgment must be {SEND_ACK_SIZE} bytes, got {}",
                response.len()
            )));
        }
        if response[..CLIENT_ID_LEN] != envelope.peer_id {
            return Err(SessionError::ProtocolViolation(
                "send acknowledgment names a different destination".to_string(),
            ));
        }

        let message_id = u32::from_le_bytes([
            response[16],
            response[17],
            response[18],
            response[19],
        ]);
        Ok(message_id)
    }

    /// One request/response exchange: header + payload out, validated
    /// payload back.
    fn round_trip(
        &mut self,
        client_id: ClientId,
        code: RequestCode,
        payload: &[u8],
    ) -> Result<Vec<u8>, SessionError> {
        let header = RequestHeader::new(client_id, code, payload.len() as u32);
        let request = wire::encode_request(&header, payload);

        debug!(code = header.code, payload_len = payload.len(), "request");
        let (response, response_payload) = self.transport.round_trip(&request)?;

        if response_payload.len() != response.payload_size as usize {
            return Err(SessionError::ProtocolViolation(format!(
                "response declares {} payload bytes but delivered {}",
                response.payload_size,
                response_payload.len()
            )));
        }
        if response.code != code.expected_response() as u16 {
            return Err(SessionError::ServerRejected(response.code));
        }

        debug!(code = response.code, payload_len = response_payload.len(), "response");
        Ok(response_payload)
    }
}
