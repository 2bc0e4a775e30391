// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end facade tests against a scripted transport.

use std::fs;

use courier_core::crypto::{
    generate_keypair, AesGcmCipher, AsymmetricCipher, SealedBoxCipher, SessionKey,
    SymmetricCipher,
};
use courier_core::directory::KeyState;
use courier_core::dispatch::{DispatchError, InterpretedEvent};
use courier_core::identity::FileIdentityStore;
use courier_core::network::MockTransport;
use courier_core::session::{SessionClient, SessionError};
use courier_core::wire::{
    encode_peer_entry, encode_waiting_record, MessageKind, RequestCode, RequestHeader,
    ResponseCode, SEND_PAYLOAD_HEADER_SIZE,
};

const MY_ID: [u8; 16] = [0xAA; 16];

fn bob_id() -> [u8; 16] {
    let mut id = [0u8; 16];
    id[15] = 1;
    id
}

fn send_ack(dest: [u8; 16], message_id: u32) -> Vec<u8> {
    let mut ack = dest.to_vec();
    ack.extend_from_slice(&message_id.to_le_bytes());
    ack
}

/// A registered client with no scripted responses queued.
fn registered_client(dir: &tempfile::TempDir) -> SessionClient<MockTransport> {
    let store = FileIdentityStore::new(dir.path().join("me.info"));
    let mut transport = MockTransport::new();
    transport.push_response(ResponseCode::RegisterOk, MY_ID.to_vec());

    let mut client = SessionClient::new(transport, Box::new(store)).unwrap();
    client.register("alice").unwrap();
    client
}

#[test]
fn test_register_assigns_identity_and_persists_it() {
    let dir = tempfile::tempdir().unwrap();
    let client = registered_client(&dir);

    let identity = client.identity().expect("registered");
    assert_eq!(identity.id(), &MY_ID);
    assert_eq!(identity.name(), "alice");

    // The identity file is on disk and a fresh client picks it up.
    let store = FileIdentityStore::new(dir.path().join("me.info"));
    let reloaded = SessionClient::new(MockTransport::new(), Box::new(store)).unwrap();
    assert_eq!(reloaded.identity().unwrap().name(), "alice");
}

#[test]
fn test_register_sends_zero_client_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    let request = client.transport_mut().last_request().unwrap().to_vec();
    let (header, _) = RequestHeader::from_bytes(&request).unwrap();
    assert_eq!(header.client_id, [0u8; 16]);
    assert_eq!(header.code, RequestCode::Register as u16);
}

#[test]
fn test_register_twice_is_rejected_locally() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    let err = client.register("alice2").unwrap_err();
    assert!(matches!(err, SessionError::AlreadyRegistered));
    // No request went out for the second attempt.
    assert_eq!(client.transport_mut().requests().len(), 1);
}

#[test]
fn test_register_duplicate_username_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("me.info");
    let store = FileIdentityStore::new(&path);
    let mut transport = MockTransport::new();
    transport.push_response(ResponseCode::RegisterOk, MY_ID.to_vec());
    let mut client = SessionClient::new(transport, Box::new(store)).unwrap();

    // Another process wrote an identity file in the meantime.
    fs::write(&path, "someone\n").unwrap();

    let err = client.register("alice").unwrap_err();
    assert!(matches!(err, SessionError::DuplicateUsername));
}

#[test]
fn test_register_server_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileIdentityStore::new(dir.path().join("me.info"));
    let mut transport = MockTransport::new();
    transport.push_raw_response(9000, Vec::new());

    let mut client = SessionClient::new(transport, Box::new(store)).unwrap();
    let err = client.register("alice").unwrap_err();
    assert!(matches!(err, SessionError::ServerRejected(9000)));
    assert!(client.identity().is_none());
}

#[test]
fn test_operations_require_registration() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileIdentityStore::new(dir.path().join("me.info"));
    let mut client = SessionClient::new(MockTransport::new(), Box::new(store)).unwrap();

    assert!(matches!(
        client.list_peers().unwrap_err(),
        SessionError::NotRegistered
    ));
    assert!(matches!(
        client.poll_messages().unwrap_err(),
        SessionError::NotRegistered
    ));
    // Nothing reached the transport.
    assert!(client.transport_mut().requests().is_empty());
}

#[test]
fn test_list_peers_populates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    let mut payload = encode_peer_entry(&bob_id(), "bob").unwrap();
    payload.extend(encode_peer_entry(&[2u8; 16], "carol").unwrap());
    client
        .transport_mut()
        .push_response(ResponseCode::PeerList, payload);

    let peers = client.list_peers().unwrap();
    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].1, "bob");

    let bob = client.directory().find_by_name("bob").unwrap();
    assert_eq!(bob.id, bob_id());
    assert_eq!(bob.key_state(), KeyState::NoKey);
}

#[test]
fn test_full_key_exchange_and_text_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    // Server knows one other client, bob.
    let (bob_secret, bob_public) = generate_keypair();
    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    // Fetch bob's public key.
    let mut key_response = bob_id().to_vec();
    key_response.extend_from_slice(&bob_public);
    client
        .transport_mut()
        .push_response(ResponseCode::PublicKey, key_response);
    client.fetch_public_key("bob").unwrap();
    assert_eq!(
        client.directory().find_by_name("bob").unwrap().key_state(),
        KeyState::PublicKeyKnown
    );

    // Send bob a fresh session key.
    client
        .transport_mut()
        .push_response(ResponseCode::MessageQueued, send_ack(bob_id(), 7));
    let message_id = client.send_session_key("bob").unwrap();
    assert_eq!(message_id, 7);

    let bob = client.directory().find_by_name("bob").unwrap();
    assert_eq!(bob.key_state(), KeyState::SessionKeyEstablished);
    let session_key = bob.session_key.as_ref().unwrap().as_bytes().to_vec();

    // What actually went over the wire is that same key, sealed for bob.
    let request = client.transport_mut().last_request().unwrap().to_vec();
    let (header, payload) = RequestHeader::from_bytes(&request).unwrap();
    assert_eq!(header.code, RequestCode::SendMessage as u16);
    assert_eq!(payload[16], MessageKind::KeySend as u8);
    let sealed = &payload[SEND_PAYLOAD_HEADER_SIZE..];
    let recovered = SealedBoxCipher.decrypt(&bob_secret, sealed).unwrap();
    assert_eq!(recovered, session_key);

    // With the key established, text goes through.
    client
        .transport_mut()
        .push_response(ResponseCode::MessageQueued, send_ack(bob_id(), 8));
    assert_eq!(client.send_text("bob", "meet at noon").unwrap(), 8);
}

#[test]
fn test_send_text_before_key_exchange_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    let err = client.send_text("bob", "hello?").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Dispatch(DispatchError::MissingSessionKey(_))
    ));
    // Nothing was sent: register + list only.
    assert_eq!(client.transport_mut().requests().len(), 2);
}

#[test]
fn test_send_to_unknown_peer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    let err = client.send_text("nobody", "hello?").unwrap_err();
    assert!(matches!(err, SessionError::Directory(_)));
}

#[test]
fn test_fetch_public_key_rejects_mismatched_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    let (_, key) = generate_keypair();
    let mut response = [0x99u8; 16].to_vec(); // wrong peer id
    response.extend_from_slice(&key);
    client
        .transport_mut()
        .push_response(ResponseCode::PublicKey, response);

    let err = client.fetch_public_key("bob").unwrap_err();
    assert!(matches!(err, SessionError::ProtocolViolation(_)));
    assert_eq!(
        client.directory().find_by_name("bob").unwrap().key_state(),
        KeyState::NoKey
    );
}

#[test]
fn test_poll_receives_key_send_then_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    // Bob sends us a session key sealed under our public key, followed by
    // a text encrypted with that key, in the same batch.
    let my_public = client.identity().unwrap().public_key_blob();
    let key = SessionKey::from_bytes([0x66; 16]);
    let sealed = SealedBoxCipher.encrypt(&my_public, key.as_bytes()).unwrap();
    let ciphertext = AesGcmCipher.encrypt(&key, b"got your request").unwrap();

    let mut batch = encode_waiting_record(&bob_id(), 1, MessageKind::KeySend as u8, &sealed);
    batch.extend(encode_waiting_record(
        &bob_id(),
        2,
        MessageKind::Text as u8,
        &ciphertext,
    ));
    client
        .transport_mut()
        .push_response(ResponseCode::WaitingMessages, batch);

    let results = client.poll_messages().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].as_ref().unwrap(),
        &InterpretedEvent::SessionKeyEstablished {
            peer: "bob".to_string(),
            message_id: 1
        }
    );
    assert_eq!(
        results[1].as_ref().unwrap(),
        &InterpretedEvent::TextReceived {
            peer: "bob".to_string(),
            message_id: 2,
            text: "got your request".to_string()
        }
    );
    assert_eq!(
        client.directory().find_by_name("bob").unwrap().key_state(),
        KeyState::SessionKeyEstablished
    );
}

#[test]
fn test_poll_per_record_failures_do_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    // Unknown sender, then unknown kind, then a fine KeyRequest from bob.
    let mut batch = encode_waiting_record(&[0xEE; 16], 1, MessageKind::KeyRequest as u8, &[]);
    batch.extend(encode_waiting_record(&bob_id(), 2, 42, &[1, 2, 3]));
    batch.extend(encode_waiting_record(
        &bob_id(),
        3,
        MessageKind::KeyRequest as u8,
        &[],
    ));
    client
        .transport_mut()
        .push_response(ResponseCode::WaitingMessages, batch);

    let results = client.poll_messages().unwrap();
    assert_eq!(results.len(), 3);
    assert!(matches!(
        results[0],
        Err(DispatchError::UnknownSender(_))
    ));
    assert!(matches!(
        results[1],
        Err(DispatchError::UnknownMessageKind(42))
    ));
    assert_eq!(
        results[2].as_ref().unwrap(),
        &InterpretedEvent::KeyRequested {
            peer: "bob".to_string(),
            message_id: 3
        }
    );
}

#[test]
fn test_poll_truncated_batch_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    let mut batch = encode_waiting_record(&bob_id(), 1, MessageKind::Text as u8, &[1, 2, 3, 4]);
    batch.pop();
    client
        .transport_mut()
        .push_response(ResponseCode::WaitingMessages, batch);

    let err = client.poll_messages().unwrap_err();
    assert!(matches!(err, SessionError::Wire(_)));
}

#[test]
fn test_declared_length_mismatch_is_a_protocol_violation() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    client.transport_mut().push_mismatched_response(
        ResponseCode::PeerList as u16,
        1000,
        Vec::new(),
    );

    let err = client.list_peers().unwrap_err();
    assert!(matches!(err, SessionError::ProtocolViolation(_)));
}

#[test]
fn test_send_ack_for_wrong_destination_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    client
        .transport_mut()
        .push_response(ResponseCode::MessageQueued, send_ack([0x99; 16], 7));
    let err = client.request_session_key("bob").unwrap_err();
    assert!(matches!(err, SessionError::ProtocolViolation(_)));
}

#[test]
fn test_failed_key_send_leaves_no_session_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = registered_client(&dir);

    let (_, bob_public) = generate_keypair();
    client.transport_mut().push_response(
        ResponseCode::PeerList,
        encode_peer_entry(&bob_id(), "bob").unwrap(),
    );
    client.list_peers().unwrap();

    let mut key_response = bob_id().to_vec();
    key_response.extend_from_slice(&bob_public);
    client
        .transport_mut()
        .push_response(ResponseCode::PublicKey, key_response);
    client.fetch_public_key("bob").unwrap();

    // The server turns the send down.
    client.transport_mut().push_raw_response(9000, Vec::new());
    let err = client.send_session_key("bob").unwrap_err();
    assert!(matches!(err, SessionError::ServerRejected(9000)));

    // The generated key was never stored.
    assert_eq!(
        client.directory().find_by_name("bob").unwrap().key_state(),
        KeyState::PublicKeyKnown
    );
}
