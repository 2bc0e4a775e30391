// SPDX-FileCopyrightText: 2026 Courier Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the key exchange and message dispatch engines.

use courier_core::crypto::{
    generate_keypair, AesGcmCipher, SealedBoxCipher, SessionKey, SymmetricCipher,
};
use courier_core::directory::{PeerDirectory, PeerRecord};
use courier_core::dispatch::{DispatchError, InterpretedEvent, MessageDispatch};
use courier_core::exchange::{ExchangeError, KeyExchange};
use courier_core::wire::{encode_waiting_record, MessageKind, WaitingRecord};

fn dispatch() -> MessageDispatch<SealedBoxCipher, AesGcmCipher> {
    MessageDispatch::new(SealedBoxCipher, AesGcmCipher)
}

fn peer_with_key(name: &str, id_byte: u8) -> (PeerRecord, [u8; 32]) {
    let (secret, public) = generate_keypair();
    let peer = PeerRecord {
        id: [id_byte; 16],
        name: name.to_string(),
        public_key: Some(public),
        session_key: None,
    };
    (peer, secret)
}

#[test]
fn test_wrap_then_unwrap_recovers_key() {
    let exchange = KeyExchange::new(SealedBoxCipher);
    let (peer, secret) = peer_with_key("bob", 1);

    let (key, sealed) = exchange.wrap_new_session_key(&peer).unwrap();
    let recovered = exchange.unwrap_session_key(&secret, &sealed).unwrap();

    assert_eq!(recovered.as_bytes(), key.as_bytes());
}

#[test]
fn test_wrap_requires_public_key() {
    let exchange = KeyExchange::new(SealedBoxCipher);
    let peer = PeerRecord {
        id: [1u8; 16],
        name: "bob".to_string(),
        public_key: None,
        session_key: None,
    };

    let err = exchange.wrap_new_session_key(&peer).unwrap_err();
    assert_eq!(err, ExchangeError::MissingKeyMaterial("bob".to_string()));
}

#[test]
fn test_unwrap_rejects_wrong_length_key() {
    let exchange = KeyExchange::new(SealedBoxCipher);
    let (peer, secret) = peer_with_key("bob", 1);

    // Seal something that is not 16 bytes against our own blob.
    use courier_core::crypto::AsymmetricCipher;
    let sealed = SealedBoxCipher
        .encrypt(&peer.public_key.unwrap(), b"way too short")
        .unwrap();

    let err = exchange.unwrap_session_key(&secret, &sealed).unwrap_err();
    assert_eq!(err, ExchangeError::BadKeyLength(13));
}

#[test]
fn test_text_envelope_requires_session_key() {
    let dispatch = dispatch();
    let (peer, _) = peer_with_key("bob", 1);

    let err = dispatch
        .build_envelope(&peer, MessageKind::Text, b"hi")
        .unwrap_err();
    assert_eq!(err, DispatchError::MissingSessionKey("bob".to_string()));
    // Precondition failure must not have minted any key material.
    assert!(peer.session_key.is_none());
}

#[test]
fn test_key_request_envelope_is_empty() {
    let dispatch = dispatch();
    let (peer, _) = peer_with_key("bob", 1);

    let envelope = dispatch
        .build_envelope(&peer, MessageKind::KeyRequest, &[])
        .unwrap();
    assert_eq!(envelope.kind, MessageKind::KeyRequest);
    assert!(envelope.content.is_empty());
    assert_eq!(envelope.peer_id, peer.id);
}

#[test]
fn test_text_envelope_decrypts_back() {
    let dispatch = dispatch();
    let (mut peer, _) = peer_with_key("bob", 1);
    let key = SessionKey::from_bytes([0x42; 16]);
    peer.session_key = Some(key.clone());

    let envelope = dispatch
        .build_envelope(&peer, MessageKind::Text, b"meet at noon")
        .unwrap();
    let plaintext = AesGcmCipher.decrypt(&key, &envelope.content).unwrap();
    assert_eq!(plaintext, b"meet at noon");
}

#[test]
fn test_build_key_send_returns_the_sealed_key() {
    let dispatch = dispatch();
    let (peer, secret) = peer_with_key("bob", 1);

    let (envelope, key) = dispatch.build_key_send(&peer).unwrap();
    assert_eq!(envelope.kind, MessageKind::KeySend);

    let recovered = dispatch
        .exchange()
        .unwrap_session_key(&secret, &envelope.content)
        .unwrap();
    assert_eq!(recovered.as_bytes(), key.as_bytes());
}

#[test]
fn test_interpret_key_request() {
    let dispatch = dispatch();
    let mut directory = PeerDirectory::new();
    directory.upsert_from_list([1u8; 16], "bob");
    let (my_secret, _) = generate_keypair();

    let record = WaitingRecord {
        sender_id: [1u8; 16],
        message_id: 9,
        kind: MessageKind::KeyRequest as u8,
        content: Vec::new(),
    };

    let event = dispatch
        .interpret(&record, &mut directory, &my_secret)
        .unwrap();
    assert_eq!(
        event,
        InterpretedEvent::KeyRequested {
            peer: "bob".to_string(),
            message_id: 9
        }
    );
    // No automatic reply: bob still has no key material on file.
    assert!(directory.find_by_name("bob").unwrap().session_key.is_none());
}

#[test]
fn test_interpret_key_send_records_session_key() {
    let dispatch = dispatch();
    let mut directory = PeerDirectory::new();
    directory.upsert_from_list([1u8; 16], "bob");

    let (my_secret, my_public) = generate_keypair();
    let key = SessionKey::from_bytes([0x33; 16]);

    use courier_core::crypto::AsymmetricCipher;
    let sealed = SealedBoxCipher.encrypt(&my_public, key.as_bytes()).unwrap();

    let record = WaitingRecord {
        sender_id: [1u8; 16],
        message_id: 3,
        kind: MessageKind::KeySend as u8,
        content: sealed,
    };

    let event = dispatch
        .interpret(&record, &mut directory, &my_secret)
        .unwrap();
    assert_eq!(
        event,
        InterpretedEvent::SessionKeyEstablished {
            peer: "bob".to_string(),
            message_id: 3
        }
    );
    let stored = directory.find_by_name("bob").unwrap();
    assert_eq!(stored.session_key.as_ref().unwrap().as_bytes(), &[0x33; 16]);
}

#[test]
fn test_interpret_text_and_file() {
    let dispatch = dispatch();
    let mut directory = PeerDirectory::new();
    directory.upsert_from_list([1u8; 16], "bob");
    let key = SessionKey::from_bytes([0x44; 16]);
    directory.record_session_key("bob", key.clone()).unwrap();
    let (my_secret, _) = generate_keypair();

    let text_record = WaitingRecord {
        sender_id: [1u8; 16],
        message_id: 4,
        kind: MessageKind::Text as u8,
        content: AesGcmCipher.encrypt(&key, b"hello").unwrap(),
    };
    let event = dispatch
        .interpret(&text_record, &mut directory, &my_secret)
        .unwrap();
    assert_eq!(
        event,
        InterpretedEvent::TextReceived {
            peer: "bob".to_string(),
            message_id: 4,
            text: "hello".to_string()
        }
    );

    let file_record = WaitingRecord {
        sender_id: [1u8; 16],
        message_id: 5,
        kind: MessageKind::File as u8,
        content: AesGcmCipher.encrypt(&key, &[0, 159, 146, 150]).unwrap(),
    };
    let event = dispatch
        .interpret(&file_record, &mut directory, &my_secret)
        .unwrap();
    assert_eq!(
        event,
        InterpretedEvent::FileReceived {
            peer: "bob".to_string(),
            message_id: 5,
            bytes: vec![0, 159, 146, 150]
        }
    );
}

#[test]
fn test_interpret_unknown_sender() {
    let dispatch = dispatch();
    let mut directory = PeerDirectory::new();
    let (my_secret, _) = generate_keypair();

    let record = WaitingRecord {
        sender_id: [0xEE; 16],
        message_id: 1,
        kind: MessageKind::KeyRequest as u8,
        content: Vec::new(),
    };

    let err = dispatch
        .interpret(&record, &mut directory, &my_secret)
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnknownSender(hex::encode([0xEE; 16]))
    );
}

#[test]
fn test_interpret_unknown_kind() {
    let dispatch = dispatch();
    let mut directory = PeerDirectory::new();
    directory.upsert_from_list([1u8; 16], "bob");
    let (my_secret, _) = generate_keypair();

    let record = WaitingRecord {
        sender_id: [1u8; 16],
        message_id: 1,
        kind: 99,
        content: vec![1, 2, 3],
    };

    let err = dispatch
        .interpret(&record, &mut directory, &my_secret)
        .unwrap_err();
    assert_eq!(err, DispatchError::UnknownMessageKind(99));
}

#[test]
fn test_unknown_kind_does_not_poison_the_batch() {
    // Records carry their own length, so a kind we cannot interpret is
    // still skippable and the records after it decode fine.
    let mut batch = encode_waiting_record(&[1u8; 16], 1, 99, &[0xFF; 10]);
    batch.extend(encode_waiting_record(
        &[1u8; 16],
        2,
        MessageKind::KeyRequest as u8,
        &[],
    ));

    let records = courier_core::dispatch::drain_batch(&batch).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].message_id, 2);
}
